//! # LibraSil Scraper
//!
//! Incrementally scrapes the word list of the V-LibraSil Brazilian Sign
//! Language dictionary, one listing page at a time, appending the words to a
//! text file and recording the last completed page so an interrupted run can
//! pick up where it left off.
//!
//! ## Usage
//!
//! ```sh
//! librasil_scraper
//! RUST_LOG=debug librasil_scraper --words-file data/words.txt
//! ```
//!
//! ## Architecture
//!
//! 1. **Resume**: Read the page to start from (page 1 on a fresh run)
//! 2. **Fetch**: Download one listing page, retrying transient failures
//! 3. **Extract**: Pull the words out of the listing table
//! 4. **Persist**: Append the words, then record the page as done
//!
//! The loop ends on the first page without words, when a page keeps failing,
//! or on Ctrl-C.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod controller;
mod models;
mod retry;
mod scrapers;
mod storage;
mod utils;

use cli::Cli;
use controller::ScrapeController;
use retry::RetryFetch;
use scrapers::librasil::HttpPageFetcher;
use storage::{ProgressStore, WordStore};
use utils::ensure_parent_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("librasil_scraper starting up");

    let config = Cli::parse().into_config();
    debug!(?config, "Parsed CLI arguments");

    for path in [&config.words_path, &config.progress_path] {
        if let Err(e) = ensure_parent_dir(path).await {
            error!(path = %path.display(), error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let words = WordStore::new(&config.words_path);
    let progress = ProgressStore::new(&config.progress_path);
    info!(
        words = %words.path().display(),
        progress = %progress.path().display(),
        "Persisting scrape output"
    );
    let fetcher = RetryFetch::from_config(
        HttpPageFetcher::new(config.base_url.clone(), config.request_timeout)?,
        &config,
    );
    debug!(?fetcher, "Retry policy");

    let summary = ScrapeController::new(fetcher, words.clone(), progress)
        .run(interrupted())
        .await?;

    match words.read_all().await {
        Ok(all) => info!(path = %words.path().display(), total = all.len(), "Word list size"),
        Err(e) => warn!(path = %words.path().display(), error = %e, "Could not read back word list"),
    }

    if summary.is_failure() {
        return Err(format!("scrape stopped early: {:?}", summary.state).into());
    }
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Scraping interrupted by user"),
        Err(e) => {
            warn!(error = %e, "Could not listen for Ctrl-C; interrupt disabled");
            std::future::pending::<()>().await
        }
    }
}

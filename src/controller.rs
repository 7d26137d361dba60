//! The page loop: load progress, fetch, extract, persist, repeat.
//!
//! # State Machine
//!
//! ```text
//! start ──load()──▶ Running(p) ──words──▶ append, save(p) ──▶ Running(p+1)
//!                       │
//!                       ├── no words / permanent status ──▶ Stopped(EndOfData)
//!                       ├── transient failure (retries spent) ──▶ Stopped(FetchFailed)
//!                       └── shutdown ──▶ Cancelled
//! ```
//!
//! Shutdown is only observed while a fetch is pending, never between the word
//! append and the progress save. The fetcher is closed on every exit path.

use crate::models::{PageIndex, ScrapeState, ScrapeSummary, StopReason};
use crate::scrapers::PageFetcher;
use crate::scrapers::librasil::extract_words;
use crate::storage::{ProgressStore, WordStore};
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Drives a [`PageFetcher`] over consecutive listing pages.
#[derive(Debug)]
pub struct ScrapeController<F> {
    fetcher: F,
    words: WordStore,
    progress: ProgressStore,
}

impl<F> ScrapeController<F>
where
    F: PageFetcher,
{
    pub fn new(fetcher: F, words: WordStore, progress: ProgressStore) -> Self {
        Self {
            fetcher,
            words,
            progress,
        }
    }

    /// Run until the listing runs out, the site keeps failing, or `shutdown`
    /// resolves.
    ///
    /// The fetcher is closed before this returns, including when a storage
    /// write fails.
    ///
    /// # Errors
    ///
    /// Returns an error only for local failures: an unreadable or corrupt
    /// progress file, or a failed write. Fetch failures end the run with
    /// [`StopReason::FetchFailed`] instead.
    #[instrument(level = "info", skip_all)]
    pub async fn run<S>(mut self, shutdown: S) -> Result<ScrapeSummary, Box<dyn Error>>
    where
        S: Future<Output = ()>,
    {
        let t0 = Instant::now();
        tokio::pin!(shutdown);

        let outcome = self.drive(shutdown.as_mut()).await;
        self.fetcher.close().await;

        let summary = match outcome {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Scrape aborted");
                return Err(e);
            }
        };

        let elapsed = t0.elapsed();
        match &summary.state {
            ScrapeState::Stopped(reason @ StopReason::FetchFailed { .. }) => error!(
                %reason,
                pages = summary.pages_scraped,
                words = summary.words_scraped,
                secs = elapsed.as_secs(),
                "Scrape stopped"
            ),
            ScrapeState::Stopped(reason) => info!(
                %reason,
                pages = summary.pages_scraped,
                words = summary.words_scraped,
                secs = elapsed.as_secs(),
                "Scrape finished"
            ),
            state => info!(
                ?state,
                pages = summary.pages_scraped,
                words = summary.words_scraped,
                secs = elapsed.as_secs(),
                "Scrape ended"
            ),
        }
        info!(
            total = summary.words_scraped,
            start_page = summary.start_page,
            last_completed_page = ?summary.last_completed_page,
            "Total words scraped"
        );

        Ok(summary)
    }

    async fn drive<S>(&mut self, mut shutdown: Pin<&mut S>) -> Result<ScrapeSummary, Box<dyn Error>>
    where
        S: Future<Output = ()>,
    {
        let start_page = self.progress.load().await?;
        let mut summary = ScrapeSummary {
            state: ScrapeState::Running { page: start_page },
            start_page,
            last_completed_page: None,
            pages_scraped: 0,
            words_scraped: 0,
        };

        while let ScrapeState::Running { page } = summary.state {
            let fetched = tokio::select! {
                biased;
                _ = shutdown.as_mut() => {
                    info!(page, "Scraping process was cancelled");
                    summary.state = ScrapeState::Cancelled { page };
                    continue;
                }
                fetched = self.fetcher.fetch_page(page) => fetched,
            };

            summary.state = match fetched {
                Ok(html) => self.persist_page(page, &html, &mut summary).await?,
                Err(e) if e.is_transient() => {
                    warn!(page, error = %e, "Giving up on page");
                    ScrapeState::Stopped(StopReason::FetchFailed {
                        page,
                        error: e.to_string(),
                    })
                }
                Err(e) => {
                    info!(page, error = %e, "Page refused; treating as end of listing");
                    ScrapeState::Stopped(StopReason::EndOfData { page })
                }
            };
        }

        debug_assert!(summary.state.is_terminal());
        Ok(summary)
    }

    /// Extract and store one page; returns the next state.
    async fn persist_page(
        &self,
        page: PageIndex,
        html: &str,
        summary: &mut ScrapeSummary,
    ) -> Result<ScrapeState, Box<dyn Error>> {
        let words = extract_words(html);
        if words.is_empty() {
            info!(page, "No more words found. Stopping");
            return Ok(ScrapeState::Stopped(StopReason::EndOfData { page }));
        }

        self.words.append(&words).await?;
        self.progress.save(page).await?;

        summary.last_completed_page = Some(page);
        summary.pages_scraped += 1;
        summary.words_scraped += words.len();
        info!(page, count = words.len(), "Scraped words from page");

        match page.checked_add(1) {
            Some(next) => Ok(ScrapeState::Running { page: next }),
            None => {
                warn!(page, "Reached the last representable page index");
                Ok(ScrapeState::Stopped(StopReason::EndOfData { page }))
            }
        }
    }
}

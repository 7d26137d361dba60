//! Command-line interface definitions for the V-LibraSil scraper.
//!
//! Every option has a default, so running the binary with no arguments
//! scrapes the whole listing into the working directory.

use crate::models::{
    MAX_RETRIES, PROGRESS_FILE, REQUEST_TIMEOUT_SECS, RETRY_BASE_DELAY_MS, ScrapeConfig,
    WORDS_FILE,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape (or resume scraping) into the current directory
/// librasil_scraper
///
/// # Keep output elsewhere and fail fast on a flaky network
/// librasil_scraper --words-file data/words.txt --progress-file data/progress.txt --max-retries 0
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// File the scraped words are appended to, one per line
    #[arg(long, default_value = WORDS_FILE)]
    pub words_file: PathBuf,

    /// File holding the page to resume from
    #[arg(long, default_value = PROGRESS_FILE)]
    pub progress_file: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Retries for a page that fails with a timeout, connection error or 5xx
    #[arg(long, default_value_t = MAX_RETRIES)]
    pub max_retries: usize,

    /// Delay before the first retry in milliseconds (doubles per attempt)
    #[arg(long, default_value_t = RETRY_BASE_DELAY_MS)]
    pub retry_delay_ms: u64,
}

impl Cli {
    /// Convert the parsed arguments into a [`ScrapeConfig`].
    pub fn into_config(self) -> ScrapeConfig {
        ScrapeConfig {
            words_path: self.words_file,
            progress_path: self.progress_file,
            request_timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_millis(self.retry_delay_ms),
            ..ScrapeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BASE_URL;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["librasil_scraper"]);

        assert_eq!(cli.words_file, PathBuf::from("v_librasil_words.txt"));
        assert_eq!(cli.progress_file, PathBuf::from("v_librasil_progress.txt"));
        assert_eq!(cli.timeout_secs, 30);
        assert_eq!(cli.max_retries, 3);
        assert_eq!(cli.retry_delay_ms, 1000);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "librasil_scraper",
            "--words-file",
            "/tmp/words.txt",
            "--progress-file",
            "/tmp/progress.txt",
            "--timeout-secs",
            "5",
            "--max-retries",
            "0",
        ]);

        assert_eq!(cli.words_file, PathBuf::from("/tmp/words.txt"));
        assert_eq!(cli.progress_file, PathBuf::from("/tmp/progress.txt"));
        assert_eq!(cli.timeout_secs, 5);
        assert_eq!(cli.max_retries, 0);
    }

    #[test]
    fn test_into_config_keeps_fixed_site() {
        let config = Cli::parse_from(["librasil_scraper", "--retry-delay-ms", "250"]).into_config();

        assert_eq!(config.base_url.as_str(), BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry_base_delay, Duration::from_millis(250));
        assert_eq!(config.retry_max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_cli_rejects_site_override() {
        assert!(Cli::try_parse_from(["librasil_scraper", "--base-url", "http://example.com"]).is_err());
    }
}

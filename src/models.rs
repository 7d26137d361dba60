//! Data models shared by the fetcher, the stores and the controller.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ScrapeConfig`]: Everything the controller needs to know about where to
//!   fetch from and where to persist to
//! - [`ScrapeState`] / [`StopReason`]: The controller's state machine
//! - [`ScrapeSummary`]: The final report of a run

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// 1-based index of a listing page on the dictionary site.
pub type PageIndex = u32;

/// The dictionary listing every run scrapes.
pub const BASE_URL: &str = "https://libras.cin.ufpe.br/";
/// Default path of the append-only word list.
pub const WORDS_FILE: &str = "v_librasil_words.txt";
/// Default path of the resume marker.
pub const PROGRESS_FILE: &str = "v_librasil_progress.txt";
/// Default per-request timeout, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default number of retries for a transient fetch failure.
pub const MAX_RETRIES: usize = 3;
/// Default delay before the first retry, in milliseconds.
pub const RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Runtime configuration of a scrape.
///
/// Built from the command line by [`crate::cli::Cli::into_config`]; tests
/// construct it directly to point the stores at a temporary directory.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Listing URL; the page number is appended as `?page=N`.
    pub base_url: Url,
    /// File receiving one scraped word per line.
    pub words_path: PathBuf,
    /// File holding the page to resume from.
    pub progress_path: PathBuf,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
    /// Retries allowed for a transient failure before the run is stopped.
    pub max_retries: usize,
    /// Initial backoff delay (doubles with each attempt).
    pub retry_base_delay: Duration,
    /// Backoff cap.
    pub retry_max_delay: Duration,
    /// Upper bound of the random jitter added to each backoff delay.
    pub retry_max_jitter: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(BASE_URL).expect("BASE_URL is a valid URL"),
            words_path: PathBuf::from(WORDS_FILE),
            progress_path: PathBuf::from(PROGRESS_FILE),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            retry_max_delay: Duration::from_secs(30),
            retry_max_jitter: Duration::from_millis(250),
        }
    }
}

/// Why a run stopped on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// `page` yielded no words (or the site refused it outright).
    EndOfData { page: PageIndex },
    /// `page` kept failing with transient errors after every retry.
    FetchFailed { page: PageIndex, error: String },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfData { page } => write!(f, "end of data at page {page}"),
            StopReason::FetchFailed { page, error } => {
                write!(f, "fetch failed at page {page}: {error}")
            }
        }
    }
}

/// State of the scrape controller.
///
/// `Stopped` and `Cancelled` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeState {
    Running { page: PageIndex },
    Stopped(StopReason),
    /// Interrupted while `page` was being fetched.
    Cancelled { page: PageIndex },
}

impl ScrapeState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScrapeState::Running { .. })
    }
}

/// Final report of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// Terminal state the controller ended in.
    pub state: ScrapeState,
    /// Page the run resumed from.
    pub start_page: PageIndex,
    /// Last page whose words were persisted during this run.
    pub last_completed_page: Option<PageIndex>,
    /// Pages persisted during this run.
    pub pages_scraped: usize,
    /// Words appended during this run.
    pub words_scraped: usize,
}

impl ScrapeSummary {
    /// `true` when the run ended because the site kept failing.
    pub fn is_failure(&self) -> bool {
        matches!(self.state, ScrapeState::Stopped(StopReason::FetchFailed { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let config = ScrapeConfig::default();
        assert_eq!(config.base_url.as_str(), BASE_URL);
        assert_eq!(config.words_path, PathBuf::from("v_librasil_words.txt"));
        assert_eq!(config.progress_path, PathBuf::from("v_librasil_progress.txt"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(
            StopReason::EndOfData { page: 2 }.to_string(),
            "end of data at page 2"
        );
        let failed = StopReason::FetchFailed {
            page: 7,
            error: "request to page 7 timed out".to_string(),
        };
        assert_eq!(
            failed.to_string(),
            "fetch failed at page 7: request to page 7 timed out"
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ScrapeState::Running { page: 1 }.is_terminal());
        assert!(ScrapeState::Cancelled { page: 1 }.is_terminal());
        assert!(ScrapeState::Stopped(StopReason::EndOfData { page: 1 }).is_terminal());
    }

    #[test]
    fn test_summary_failure_flag() {
        let mut summary = ScrapeSummary {
            state: ScrapeState::Stopped(StopReason::EndOfData { page: 3 }),
            start_page: 1,
            last_completed_page: Some(2),
            pages_scraped: 2,
            words_scraped: 40,
        };
        assert!(!summary.is_failure());

        summary.state = ScrapeState::Stopped(StopReason::FetchFailed {
            page: 3,
            error: "connection reset".to_string(),
        });
        assert!(summary.is_failure());

        summary.state = ScrapeState::Cancelled { page: 3 };
        assert!(!summary.is_failure());
    }
}

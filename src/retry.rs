//! Bounded retry with exponential backoff for transient fetch failures.
//!
//! [`RetryFetch`] is a decorator over any [`PageFetcher`]. It repeats a fetch
//! only when the failure is transient (see [`FetchError::is_transient`]);
//! a page that answers 404 is returned straight away so the controller can
//! treat it as the end of the listing.
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
//! ```

use crate::models::{PageIndex, ScrapeConfig};
use crate::scrapers::{FetchError, PageFetcher};
use rand::{rng, Rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Wrapper that adds exponential backoff retry logic to a [`PageFetcher`].
pub struct RetryFetch<T> {
    /// The fetcher doing the actual requests.
    inner: T,
    /// Maximum number of retries before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: Duration,
    /// Maximum delay cap.
    max_delay: Duration,
    /// Upper bound of the random jitter.
    max_jitter: Duration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    /// Create a new retry wrapper around an existing [`PageFetcher`].
    ///
    /// The delay cap defaults to 30 seconds and the jitter to 250 ms.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fetcher doing the actual requests
    /// * `max_retries` - Retries after the first attempt (0 disables retrying)
    /// * `base_delay` - Delay before the first retry
    ///
    /// # Example
    ///
    /// ```ignore
    /// let http = HttpPageFetcher::new(base_url, Duration::from_secs(30))?;
    /// let fetcher = RetryFetch::new(http, 3, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }

    /// Wrap `inner` with the retry budget from `config`.
    ///
    /// Uses `max_retries`, `retry_base_delay`, `retry_max_delay` and
    /// `retry_max_jitter`.
    pub fn from_config(inner: T, config: &ScrapeConfig) -> Self {
        let mut retry = Self::new(inner, config.max_retries, config.retry_base_delay);
        retry.max_delay = config.retry_max_delay;
        retry.max_jitter = config.retry_max_jitter;
        retry
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(31) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        delay + Duration::from_millis(rng().random_range(0..=jitter_ms))
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("max_jitter", &self.max_jitter)
            .finish()
    }
}

impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch_page(&self, page: PageIndex) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch_page(page).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            page,
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        page,
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn close(self) {
        self.inner.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays a fixed sequence of results and counts calls.
    struct Scripted {
        results: Mutex<VecDeque<Result<String, FetchError>>>,
        calls: Arc<Mutex<usize>>,
        closed: Arc<Mutex<bool>>,
    }

    impl Scripted {
        fn new(results: Vec<Result<String, FetchError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Arc::new(Mutex::new(0)),
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl PageFetcher for Scripted {
        async fn fetch_page(&self, page: PageIndex) -> Result<String, FetchError> {
            *self.calls.lock().unwrap() += 1;
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::Status { page, status: 404 }))
        }

        async fn close(self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    fn no_wait(inner: Scripted, max_retries: usize) -> RetryFetch<Scripted> {
        let mut retry = RetryFetch::new(inner, max_retries, Duration::ZERO);
        retry.max_jitter = Duration::ZERO;
        retry
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let inner = Scripted::new(vec![
            Err(FetchError::Timeout { page: 1 }),
            Err(FetchError::TransientStatus { page: 1, status: 503 }),
            Ok("<html></html>".to_string()),
        ]);
        let calls = Arc::clone(&inner.calls);
        let retry = no_wait(inner, 3);

        let body = retry.fetch_page(1).await.unwrap();
        assert_eq!(body, "<html></html>");
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let inner = Scripted::new(vec![
            Err(FetchError::Timeout { page: 4 }),
            Err(FetchError::Timeout { page: 4 }),
            Err(FetchError::Timeout { page: 4 }),
            Ok("never reached".to_string()),
        ]);
        let calls = Arc::clone(&inner.calls);
        let retry = no_wait(inner, 2);

        let err = retry.fetch_page(4).await.unwrap_err();
        assert_eq!(err, FetchError::Timeout { page: 4 });
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_status() {
        let inner = Scripted::new(vec![
            Err(FetchError::Status { page: 2, status: 404 }),
            Ok("never reached".to_string()),
        ]);
        let calls = Arc::clone(&inner.calls);
        let retry = no_wait(inner, 5);

        let err = retry.fetch_page(2).await.unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_returns_first_error() {
        let inner = Scripted::new(vec![Err(FetchError::Transport {
            page: 1,
            message: "connection reset".to_string(),
        })]);
        let calls = Arc::clone(&inner.calls);
        let retry = no_wait(inner, 0);

        assert!(retry.fetch_page(1).await.is_err());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_close_delegates() {
        let inner = Scripted::new(vec![]);
        let closed = Arc::clone(&inner.closed);
        no_wait(inner, 1).close().await;
        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn test_backoff_is_capped() {
        let mut retry = RetryFetch::new(Scripted::new(vec![]), 10, Duration::from_secs(1));
        retry.max_jitter = Duration::ZERO;
        assert_eq!(retry.backoff(1), Duration::from_secs(1));
        assert_eq!(retry.backoff(2), Duration::from_secs(2));
        assert_eq!(retry.backoff(4), Duration::from_secs(8));
        assert_eq!(retry.backoff(10), Duration::from_secs(30));
        assert_eq!(retry.backoff(64), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let retry = RetryFetch::new(Scripted::new(vec![]), 3, Duration::from_millis(100));
        for _ in 0..50 {
            let delay = retry.backoff(1);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(350));
        }
    }
}

//! V-LibraSil listing scraper.
//!
//! This module scrapes the word list of [V-LibraSil](https://libras.cin.ufpe.br/),
//! a Brazilian Sign Language dictionary. The listing is paginated through a
//! `page` query parameter and every page renders its words as links inside a
//! Bootstrap `table.table`.
//!
//! # URL Pattern
//!
//! `https://libras.cin.ufpe.br/?page=1`, `?page=2`, ... Pages past the end of
//! the listing render an empty table.

use super::{FetchError, PageFetcher};
use crate::models::PageIndex;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

static WORD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.table tbody tr td a").unwrap());

/// Build the URL of listing page `page`.
///
/// # Arguments
///
/// * `base_url` - Listing URL; existing query pairs are kept
/// * `page` - 1-based page index
///
/// # Examples
///
/// ```ignore
/// let base = Url::parse("https://libras.cin.ufpe.br/").unwrap();
/// assert_eq!(page_url(&base, 2).as_str(), "https://libras.cin.ufpe.br/?page=2");
/// ```
pub fn page_url(base_url: &Url, page: PageIndex) -> Url {
    let mut url = base_url.clone();
    url.query_pairs_mut().append_pair("page", &page.to_string());
    url
}

/// Extract the words listed on a page.
///
/// Runs of whitespace inside an anchor (including line breaks) collapse to a
/// single space, so every word fits on one line of the word list.
///
/// # Arguments
///
/// * `html` - Raw HTML of a listing page
///
/// # Returns
///
/// The trimmed text of every anchor under `table.table tbody tr td`, in
/// document order. Documents without that table yield an empty list.
///
/// # Examples
///
/// ```ignore
/// let html = r#"<table class="table"><tbody><tr><td><a> bom
///     dia </a></td></tr></tbody></table>"#;
/// assert_eq!(extract_words(html), vec!["bom dia"]);
/// ```
pub fn extract_words(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&WORD_SELECTOR)
        .map(|a| {
            a.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// [`PageFetcher`] backed by a `reqwest` client.
#[derive(Debug)]
pub struct HttpPageFetcher {
    client: Client,
    base_url: Url,
}

impl HttpPageFetcher {
    /// Build a fetcher whose requests all time out after `timeout`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Listing URL the page number is appended to
    /// * `timeout` - Per-request timeout (30 seconds by default)
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().timeout(timeout).build()?;
        info!(%base_url, ?timeout, "HTTP client ready");
        Ok(Self { client, base_url })
    }
}

impl PageFetcher for HttpPageFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_page(&self, page: PageIndex) -> Result<String, FetchError> {
        let url = page_url(&self.base_url, page);
        debug!(%url, "Fetching listing page");

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(page, %url, error = %e, "Request failed");
                return Err(classify_transport_error(page, &e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(page, status = status.as_u16(), "Skipping page: non-success HTTP status");
            return Err(FetchError::from_status(page, status.as_u16()));
        }

        match response.text().await {
            Ok(body) => {
                debug!(page, bytes = body.len(), preview = %truncate_for_log(&body, 120), "Fetched listing page");
                Ok(body)
            }
            Err(e) => {
                warn!(page, error = %e, "Failed reading response body");
                Err(classify_transport_error(page, &e))
            }
        }
    }

    async fn close(self) {
        drop(self.client);
        info!("HTTP client closed");
    }
}

fn classify_transport_error(page: PageIndex, e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout { page }
    } else {
        FetchError::Transport {
            page,
            message: e.to_string(),
        }
    }
}

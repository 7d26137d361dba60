//! Page fetching for the dictionary listing.
//!
//! The controller only talks to the site through the [`PageFetcher`] trait,
//! which keeps the HTTP transport swappable for fakes in tests and for
//! decorators such as [`crate::retry::RetryFetch`].
//!
//! # Failure Model
//!
//! A fetch never panics and never hides a failure behind an empty page.
//! Every failure comes back as a [`FetchError`]; [`FetchError::is_transient`]
//! tells the caller whether trying again could help.
//!
//! | Variant | Cause | Transient |
//! |---------|-------|-----------|
//! | `Status` | 4xx / other non-success status | no |
//! | `TransientStatus` | 5xx, 408, 429 | yes |
//! | `Timeout` | request exceeded its timeout | yes |
//! | `Transport` | connection / TLS / body read failure | yes |

pub mod librasil;

use crate::models::PageIndex;
use thiserror::Error;

/// Why a listing page could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("page {page} answered with HTTP {status}")]
    Status { page: PageIndex, status: u16 },

    #[error("page {page} answered with HTTP {status} (temporary)")]
    TransientStatus { page: PageIndex, status: u16 },

    #[error("request for page {page} timed out")]
    Timeout { page: PageIndex },

    #[error("request for page {page} failed: {message}")]
    Transport { page: PageIndex, message: String },
}

impl FetchError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::Status { .. })
    }

    /// Classify a non-success HTTP status for `page`.
    pub fn from_status(page: PageIndex, status: u16) -> Self {
        if status >= 500 || status == 408 || status == 429 {
            FetchError::TransientStatus { page, status }
        } else {
            FetchError::Status { page, status }
        }
    }
}

/// Source of raw listing pages.
///
/// Implementors own whatever transport they use and must release it in
/// [`PageFetcher::close`].
pub trait PageFetcher {
    /// Fetch the raw HTML of listing page `page`.
    async fn fetch_page(&self, page: PageIndex) -> Result<String, FetchError>;

    /// Release the underlying transport.
    async fn close(self);
}

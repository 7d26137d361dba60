//! Resume marker for the page loop.

use crate::models::PageIndex;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Failure to read or write the progress file.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("progress file {path} does not contain a page number: {content:?}")]
    Invalid { path: PathBuf, content: String },

    #[error("progress file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Durable single-integer state: the page a run resumes from.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    /// Create a store backed by the file at `path`.
    ///
    /// Nothing is read or created until [`load`](Self::load) or
    /// [`save`](Self::save) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted page, or `1` when nothing has been persisted yet.
    ///
    /// # Returns
    ///
    /// The page to resume from. Surrounding whitespace in the file is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Invalid`] when the file exists but does not
    /// hold a positive integer, and [`ProgressError::Io`] when it cannot be read.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<PageIndex, ProgressError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No progress file found; starting from page 1");
                return Ok(1);
            }
            Err(source) => {
                return Err(ProgressError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match content.trim().parse::<PageIndex>() {
            Ok(page) if page > 0 => {
                info!(page, "Resuming from saved progress");
                Ok(page)
            }
            _ => Err(ProgressError::Invalid {
                path: self.path.clone(),
                content,
            }),
        }
    }

    /// Overwrite the persisted page with `page`.
    ///
    /// The file ends up holding only the decimal number, with no trailing
    /// newline. The write is not atomic.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Io`] if the file cannot be written.
    pub async fn save(&self, page: PageIndex) -> Result<(), ProgressError> {
        fs::write(&self.path, page.to_string())
            .await
            .map_err(|source| ProgressError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!(page, path = %self.path.display(), "Saved progress");
        Ok(())
    }
}

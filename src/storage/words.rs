//! Append-only word list.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Durable append-only log of scraped words, one per line.
#[derive(Debug, Clone)]
pub struct WordStore {
    path: PathBuf,
}

impl WordStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `words` to the end of the list, each followed by `\n`.
    ///
    /// The file is created when missing. The handle is dropped before this
    /// returns, whether or not the write succeeded.
    ///
    /// # Arguments
    ///
    /// * `words` - Words of one listing page, in page order
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be opened or
    /// written (for example when its directory does not exist).
    ///
    /// # Example
    ///
    /// ```ignore
    /// store.append(&["a".to_string(), "b".to_string()]).await?;
    /// store.append(&["c".to_string()]).await?;
    /// // file now ends with "a\nb\nc\n"
    /// ```
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), count = words.len()))]
    pub async fn append(&self, words: &[String]) -> io::Result<()> {
        let mut buf = String::with_capacity(words.iter().map(|w| w.len() + 1).sum());
        for word in words {
            buf.push_str(word);
            buf.push('\n');
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        debug!("Appended words");
        Ok(())
    }

    /// Read the whole list back. Missing file reads as empty.
    pub async fn read_all(&self) -> io::Result<Vec<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

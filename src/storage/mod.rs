//! Plain-text persistence for scraped words and resume progress.
//!
//! # Submodules
//!
//! - [`progress`]: Single-integer resume marker, overwritten after every page
//! - [`words`]: Append-only word list, one word per line
//!
//! # Ordering
//!
//! The controller always appends a page's words before saving its progress,
//! so the progress file never points past data that is missing from the word
//! list. A crash between the two writes re-fetches that page on the next run
//! and duplicates its words.

pub mod progress;
pub mod words;

pub use progress::ProgressStore;
pub use words::WordStore;

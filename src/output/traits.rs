//! Output sink trait and record types
//!
//! This module defines the trait interface for artifact sinks and the
//! article record they persist.

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A retained article, written at most once, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Entry title from the feed
    pub title: String,

    /// Link to the article page
    pub link: String,

    /// Publication timestamp as the feed spells it
    pub published: String,

    /// Extracted body text
    pub content: String,
}

/// Trait for artifact sinks
///
/// A sink receives articles one at a time during a run and is finalized
/// exactly once afterward. A sink error is the only unrecoverable failure a
/// crawl run has: it propagates all the way up to a Failure job record.
pub trait ArticleSink {
    /// Appends one article row
    fn write_article(&mut self, article: &Article) -> OutputResult<()>;

    /// Flushes buffered rows and closes out the artifact
    fn finish(&mut self) -> OutputResult<()>;
}

//! Crawl engine module
//!
//! This module contains the budget-aware crawl engine and its collaborators:
//! - `engine`: discovery, source iteration, budget enforcement, finalization
//! - `fetcher`: HTTP client construction and fetch classification
//! - `feed`: feed-link discovery and feed parsing
//! - `extract`: article content extraction
//! - `budget`: content budget accounting

mod budget;
mod engine;
mod extract;
mod feed;
mod fetcher;

pub use budget::{BudgetPolicy, ContentBudget};
pub use engine::{CrawlEngine, NO_SOURCES_MESSAGE};
pub use extract::{extract_content, parse_content_selector};
pub use feed::{discover_feed_links, parse_feed, FeedEntry};
pub use fetcher::{build_http_client, fetch_page, FetchResult};

use serde::{Deserialize, Serialize};

/// Terminal summary of one crawl run; the Success payload of a crawl job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Path of the produced artifact; None when no sources were found
    pub artifact_path: Option<String>,

    /// Human-readable completion message
    pub message: String,

    /// True when the content budget halted the run before it drained
    pub stopped_early: bool,

    /// Rows written to the artifact
    pub articles_written: u64,

    /// Characters charged against the budget
    pub chars_written: u64,

    /// Wall-clock duration of the run
    pub elapsed_secs: f64,
}

impl CrawlSummary {
    /// Summary for a run whose discovery produced nothing
    ///
    /// Reported as Success with an empty artifact, not Failure: no partial
    /// work was lost.
    pub fn no_sources(elapsed_secs: f64) -> Self {
        Self {
            artifact_path: None,
            message: NO_SOURCES_MESSAGE.to_string(),
            stopped_early: false,
            articles_written: 0,
            chars_written: 0,
            elapsed_secs,
        }
    }
}

/// Receiver for free-form progress snapshots pushed while a run executes
///
/// The worker wires this to the job tracker; the engine publishes whenever it
/// moves to a new source. Publishing must never fail the run.
pub trait ProgressSink {
    fn publish(&self, progress: serde_json::Value);
}

/// Progress sink that drops every snapshot; used for inline one-shot runs
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn publish(&self, _progress: serde_json::Value) {}
}

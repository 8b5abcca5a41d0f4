//! Job store module
//!
//! The durable mapping from job id to lifecycle record, consumed everywhere
//! through the `JobStore` trait:
//! - submitting new jobs and issuing their opaque ids
//! - claiming pending jobs for execution
//! - recording progress and exactly one terminal state
//! - expiring terminal records once the retention window has passed

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteJobStore;
pub use traits::{JobStore, StoreError, StoreResult};

use crate::crawler::CrawlSummary;
use crate::state::JobState;
use crate::NewsrakeError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens the SQLite-backed job store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file (the broker endpoint)
/// * `retention_secs` - How long terminal records stay queryable
pub fn open_store(path: &Path, retention_secs: u64) -> Result<SqliteJobStore, NewsrakeError> {
    Ok(SqliteJobStore::new(path, retention_secs)?)
}

/// A job's lifecycle record as the store holds it
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Opaque token issued at submission
    pub id: String,

    /// Registered task name this job executes
    pub task: String,

    /// Current lifecycle state
    pub state: JobState,

    /// Per-job content budget override, if the submitter set one
    pub max_chars: Option<u64>,

    /// Most recent progress snapshot pushed by the worker
    pub progress: Option<serde_json::Value>,

    /// Success payload; set exactly once
    pub result: Option<CrawlSummary>,

    /// Failure description; set exactly once
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// When the terminal state was recorded; drives retention expiry
    pub completed_at: Option<DateTime<Utc>>,
}

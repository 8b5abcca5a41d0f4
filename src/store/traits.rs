//! Job store trait and error types
//!
//! This module defines the trait interface for job store backends and
//! associated error types.

use crate::crawler::CrawlSummary;
use crate::state::JobState;
use crate::store::JobRecord;
use thiserror::Error;

/// Errors that can occur during job store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job {id} is already terminal ({state}); terminal records are immutable")]
    TerminalOverwrite { id: String, state: JobState },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: JobState, to: JobState },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for job store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for job store backends
///
/// The store is the only channel between submitters and workers. It owns
/// every job record for the record's whole life; callers never hold a copy
/// they treat as authoritative. Backends enforce two rules on behalf of all
/// callers: states only move forward, and a terminal record is immutable
/// until retention expiry removes it.
pub trait JobStore {
    // ===== Submission =====

    /// Creates a Pending job and issues its opaque id
    ///
    /// # Arguments
    ///
    /// * `task` - Registered task name the worker should dispatch
    /// * `max_chars` - Optional per-job content budget override
    fn submit(&mut self, task: &str, max_chars: Option<u64>) -> StoreResult<JobRecord>;

    // ===== Reads =====

    /// Checks whether a live record exists for this id
    ///
    /// This is the authoritative existence test: ids that were never issued
    /// and ids whose terminal record has expired both answer false. State
    /// values alone cannot make that distinction.
    fn exists(&mut self, id: &str) -> StoreResult<bool>;

    /// Reads a job record, honoring retention expiry
    ///
    /// A terminal record older than the retention window is treated as
    /// absent and dropped from the store.
    fn get(&mut self, id: &str) -> StoreResult<Option<JobRecord>>;

    // ===== Worker operations =====

    /// Atomically claims the oldest Pending job, moving it to Started
    ///
    /// Returns None when nothing is pending.
    fn claim_pending(&mut self) -> StoreResult<Option<JobRecord>>;

    /// Overwrites the job's progress snapshot, moving it to InProgress
    fn set_progress(&mut self, id: &str, progress: &serde_json::Value) -> StoreResult<()>;

    /// Records the single terminal Success payload
    fn complete(&mut self, id: &str, summary: &CrawlSummary) -> StoreResult<()>;

    /// Records the single terminal Failure description
    fn fail(&mut self, id: &str, error: &str) -> StoreResult<()>;

    // ===== Housekeeping =====

    /// Deletes terminal records older than the retention window
    ///
    /// Returns how many records were removed. Reads already expire lazily;
    /// this sweep exists so abandoned records do not accumulate.
    fn purge_expired(&mut self) -> StoreResult<u64>;
}

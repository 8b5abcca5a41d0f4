//! Job lifecycle module
//!
//! This module owns everything between submission and terminal state:
//! - `tracker`: the per-job state machine over the job store
//! - `registry`: the startup-built mapping from task name to handler
//! - `worker`: the poll loop that claims and executes pending jobs
//! - `cleanup`: deferred deletion of artifacts after retention expiry

mod cleanup;
mod registry;
mod tracker;
mod worker;

pub use cleanup::{CleanupScheduler, CleanupTask, SAFETY_BUFFER};
pub use registry::{TaskFuture, TaskHandler, TaskRegistry, TASK_CRAWL_ARTICLES};
pub use tracker::{JobTracker, TrackerProgress};
pub use worker::{run_next_job, run_worker};

use crate::config::Config;
use crate::crawler::{CrawlEngine, CrawlSummary};
use crate::store::{open_store, SqliteJobStore};
use crate::NewsrakeError;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// What a status query observes for one job id at one moment
///
/// NotFound covers both ids that were never issued and ids whose terminal
/// record has expired from the store; the two are indistinguishable by
/// design once the retention window has passed.
#[derive(Debug, Clone, PartialEq)]
pub enum JobSnapshot {
    /// The store has no live record for this id
    NotFound,

    /// Submitted, no worker has picked it up yet
    Pending,

    /// Claimed by a worker, no progress reported yet
    Started,

    /// Running, with the most recent progress snapshot if any
    InProgress { progress: Option<serde_json::Value> },

    /// Finished with a result payload
    Success { result: CrawlSummary },

    /// Finished with an error description
    Failure { error: String },
}

/// Explicitly constructed application context
///
/// Holds the store and scheduler handles every handler needs. Initialized
/// once at process start and passed by reference afterward; nothing in here
/// is mutated after construction.
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<Mutex<SqliteJobStore>>,
    pub tracker: JobTracker<SqliteJobStore>,
    pub registry: TaskRegistry,
    pub cleanup: CleanupScheduler,
    pub engine: CrawlEngine,
}

impl AppContext {
    /// Builds the full context from validated configuration
    pub fn initialize(config: Config) -> Result<Self, NewsrakeError> {
        let store = open_store(
            Path::new(&config.broker.database_path),
            config.broker.retention_secs,
        )?;
        let store = Arc::new(Mutex::new(store));

        let tracker = JobTracker::new(Arc::clone(&store));
        let registry = TaskRegistry::with_builtin_tasks();
        let engine = CrawlEngine::new(&config.crawl, &config.output)?;
        let cleanup = CleanupScheduler::new();

        Ok(Self {
            config: Arc::new(config),
            store,
            tracker,
            registry,
            cleanup,
            engine,
        })
    }
}

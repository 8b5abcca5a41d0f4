//! Job lifecycle tracker
//!
//! The tracker owns the state machine per job id. It never holds job state
//! itself - every read and write goes through the store interface, and the
//! store remains the single authority for a job's lifetime.

use crate::crawler::{CrawlSummary, ProgressSink};
use crate::jobs::JobSnapshot;
use crate::state::JobState;
use crate::store::{JobStore, StoreResult};
use std::sync::{Arc, Mutex};

/// Tracks job lifecycles through a shared store handle
pub struct JobTracker<S: JobStore> {
    store: Arc<Mutex<S>>,
}

impl<S: JobStore> Clone for JobTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: JobStore> JobTracker<S> {
    /// Creates a tracker over a shared store handle
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self { store }
    }

    /// Submits a new job and returns its opaque id
    ///
    /// Submission returns immediately; execution happens on whatever worker
    /// claims the record later.
    pub fn submit(&self, task: &str, max_chars: Option<u64>) -> StoreResult<String> {
        let mut store = self.store.lock().unwrap();
        let record = store.submit(task, max_chars)?;
        tracing::info!("Submitted job {} (task: {})", record.id, record.task);
        Ok(record.id)
    }

    /// Reads the current snapshot for a job id
    ///
    /// The existence check runs first and explicitly: a Pending record and a
    /// never-issued id would otherwise be indistinguishable, and an expired
    /// terminal record must come back as NotFound rather than any cached
    /// payload.
    pub fn status(&self, id: &str) -> StoreResult<JobSnapshot> {
        let mut store = self.store.lock().unwrap();

        if !store.exists(id)? {
            return Ok(JobSnapshot::NotFound);
        }

        let record = match store.get(id)? {
            Some(record) => record,
            // Expired between the existence check and the read.
            None => return Ok(JobSnapshot::NotFound),
        };

        let snapshot = match record.state {
            JobState::Pending => JobSnapshot::Pending,
            JobState::Started => JobSnapshot::Started,
            JobState::InProgress => JobSnapshot::InProgress {
                progress: record.progress,
            },
            JobState::Success => match record.result {
                Some(result) => JobSnapshot::Success { result },
                None => JobSnapshot::Failure {
                    error: "terminal record is missing its result payload".to_string(),
                },
            },
            JobState::Failure => JobSnapshot::Failure {
                error: record
                    .error
                    .unwrap_or_else(|| "unknown error".to_string()),
            },
        };
        Ok(snapshot)
    }

    /// Records a progress snapshot for a running job
    pub fn record_progress(&self, id: &str, progress: &serde_json::Value) -> StoreResult<()> {
        let mut store = self.store.lock().unwrap();
        store.set_progress(id, progress)
    }

    /// Writes the single terminal Success record
    pub fn finalize_success(&self, id: &str, summary: &CrawlSummary) -> StoreResult<()> {
        let mut store = self.store.lock().unwrap();
        store.complete(id, summary)
    }

    /// Writes the single terminal Failure record
    pub fn finalize_failure(&self, id: &str, error: &str) -> StoreResult<()> {
        let mut store = self.store.lock().unwrap();
        store.fail(id, error)
    }
}

/// Progress sink that forwards engine snapshots into the tracker
///
/// Publishing never fails the run: a store hiccup while recording progress
/// is logged and dropped.
pub struct TrackerProgress<'a, S: JobStore> {
    tracker: &'a JobTracker<S>,
    job_id: &'a str,
}

impl<'a, S: JobStore> TrackerProgress<'a, S> {
    pub fn new(tracker: &'a JobTracker<S>, job_id: &'a str) -> Self {
        Self { tracker, job_id }
    }
}

impl<S: JobStore> ProgressSink for TrackerProgress<'_, S> {
    fn publish(&self, progress: serde_json::Value) {
        if let Err(e) = self.tracker.record_progress(self.job_id, &progress) {
            tracing::warn!("Failed to record progress for job {}: {}", self.job_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteJobStore;

    fn tracker_with_retention(retention_secs: u64) -> JobTracker<SqliteJobStore> {
        let store = SqliteJobStore::new_in_memory(retention_secs).unwrap();
        JobTracker::new(Arc::new(Mutex::new(store)))
    }

    fn sample_summary() -> CrawlSummary {
        CrawlSummary {
            artifact_path: Some("/tmp/out/test_articles_1700000000.csv".to_string()),
            message: "Crawl completed in 0.10 seconds.".to_string(),
            stopped_early: false,
            articles_written: 1,
            chars_written: 12,
            elapsed_secs: 0.1,
        }
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let tracker = tracker_with_retention(3600);
        let snapshot = tracker.status("never-issued").unwrap();
        assert_eq!(snapshot, JobSnapshot::NotFound);
    }

    #[test]
    fn test_submitted_job_is_pending() {
        let tracker = tracker_with_retention(3600);
        let id = tracker.submit("crawl_articles", None).unwrap();
        assert_eq!(tracker.status(&id).unwrap(), JobSnapshot::Pending);
    }

    #[test]
    fn test_pending_distinguished_from_never_issued() {
        let tracker = tracker_with_retention(3600);
        let id = tracker.submit("crawl_articles", None).unwrap();

        assert_eq!(tracker.status(&id).unwrap(), JobSnapshot::Pending);
        assert_eq!(
            tracker.status("some-other-id").unwrap(),
            JobSnapshot::NotFound
        );
    }

    #[test]
    fn test_progress_surfaces_latest_snapshot() {
        let tracker = tracker_with_retention(3600);
        let id = tracker.submit("crawl_articles", None).unwrap();

        tracker
            .record_progress(&id, &serde_json::json!({"source_index": 0}))
            .unwrap();
        tracker
            .record_progress(&id, &serde_json::json!({"source_index": 3}))
            .unwrap();

        match tracker.status(&id).unwrap() {
            JobSnapshot::InProgress { progress } => {
                assert_eq!(progress.unwrap()["source_index"], 3);
            }
            other => panic!("expected InProgress, got {:?}", other),
        }
    }

    #[test]
    fn test_success_snapshot_carries_result() {
        let tracker = tracker_with_retention(3600);
        let id = tracker.submit("crawl_articles", None).unwrap();
        tracker.finalize_success(&id, &sample_summary()).unwrap();

        match tracker.status(&id).unwrap() {
            JobSnapshot::Success { result } => assert_eq!(result, sample_summary()),
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_snapshot_carries_error() {
        let tracker = tracker_with_retention(3600);
        let id = tracker.submit("crawl_articles", None).unwrap();
        tracker.finalize_failure(&id, "sink I/O error").unwrap();

        assert_eq!(
            tracker.status(&id).unwrap(),
            JobSnapshot::Failure {
                error: "sink I/O error".to_string()
            }
        );
    }

    #[test]
    fn test_terminal_snapshot_stable_across_reads() {
        let tracker = tracker_with_retention(3600);
        let id = tracker.submit("crawl_articles", None).unwrap();
        tracker.finalize_success(&id, &sample_summary()).unwrap();

        let first = tracker.status(&id).unwrap();
        let second = tracker.status(&id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_expired_job_reports_not_found() {
        // Zero retention expires terminal records immediately.
        let tracker = tracker_with_retention(0);
        let id = tracker.submit("crawl_articles", None).unwrap();
        tracker.finalize_success(&id, &sample_summary()).unwrap();

        assert_eq!(tracker.status(&id).unwrap(), JobSnapshot::NotFound);
    }

    #[test]
    fn test_terminal_write_happens_once() {
        let tracker = tracker_with_retention(3600);
        let id = tracker.submit("crawl_articles", None).unwrap();
        tracker.finalize_success(&id, &sample_summary()).unwrap();

        assert!(tracker.finalize_failure(&id, "late failure").is_err());
        assert!(tracker.finalize_success(&id, &sample_summary()).is_err());
    }
}

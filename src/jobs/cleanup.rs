//! Cleanup scheduler
//!
//! Schedules deferred deletion of a completed job's artifact. The deletion
//! task fires only after the job's result has expired from the store, so a
//! client can never hold a Success payload pointing at a file that is
//! already gone.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Margin added on top of the retention window before deletion fires
pub const SAFETY_BUFFER: Duration = Duration::from_secs(10);

/// A scheduled artifact deletion
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupTask {
    /// The job whose artifact is being removed
    pub job_id: String,

    /// File to delete
    pub artifact_path: PathBuf,

    /// Earliest moment the deletion may run
    pub fire_at: DateTime<Utc>,
}

/// Schedules best-effort deferred artifact deletions
///
/// Scheduling is fire-and-forget: a failed or delayed deletion never touches
/// the already-recorded terminal job state.
pub struct CleanupScheduler {
    safety_buffer: Duration,
}

impl CleanupScheduler {
    /// Creates a scheduler with the standard safety buffer
    pub fn new() -> Self {
        Self {
            safety_buffer: SAFETY_BUFFER,
        }
    }

    /// Computes the cleanup plan for a completed job
    ///
    /// `fire_at = completed_at + retention_window + safety_buffer`, so the
    /// deletion can never precede the result's expiry from the store.
    pub fn plan(
        &self,
        job_id: &str,
        artifact_path: &Path,
        retention_secs: u64,
        completed_at: DateTime<Utc>,
    ) -> CleanupTask {
        let delay = ChronoDuration::seconds(retention_secs.min(i64::MAX as u64) as i64)
            + ChronoDuration::from_std(self.safety_buffer).unwrap_or(ChronoDuration::zero());
        CleanupTask {
            job_id: job_id.to_string(),
            artifact_path: artifact_path.to_path_buf(),
            fire_at: completed_at + delay,
        }
    }

    /// Schedules deferred deletion of a job's artifact
    ///
    /// Invoked by the worker immediately after a terminal Success record
    /// with a non-null artifact path. Returns the planned task; the deletion
    /// itself runs detached.
    pub fn on_job_complete(
        &self,
        job_id: &str,
        artifact_path: &Path,
        retention_secs: u64,
    ) -> CleanupTask {
        let task = self.plan(job_id, artifact_path, retention_secs, Utc::now());
        tracing::info!(
            "Scheduled cleanup of {} for job {} at {}",
            task.artifact_path.display(),
            task.job_id,
            task.fire_at
        );

        let delay = Duration::from_secs(retention_secs) + self.safety_buffer;
        let detached = task.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            delete_artifact(&detached);
        });

        task
    }
}

impl Default for CleanupScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Deletes the artifact, swallowing every failure
///
/// The job is already terminal by the time this runs; a missing file or a
/// permission error is logged and dropped.
fn delete_artifact(task: &CleanupTask) {
    match std::fs::remove_file(&task.artifact_path) {
        Ok(()) => {
            tracing::info!(
                "Removed artifact {} for job {}",
                task.artifact_path.display(),
                task.job_id
            );
        }
        Err(e) => {
            tracing::warn!(
                "Failed to remove artifact {} for job {}: {}",
                task.artifact_path.display(),
                task.job_id,
                e
            );
        }
    }
}

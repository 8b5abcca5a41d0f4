//! Worker loop
//!
//! Claims pending jobs from the store, dispatches them through the task
//! registry, and finalizes exactly one terminal record per job. The worker
//! is the only component that writes Started/InProgress/terminal states;
//! submitters only ever create Pending records.

use crate::jobs::AppContext;
use crate::store::JobStore;
use crate::NewsrakeError;
use std::path::Path;
use std::time::Duration;

/// Runs the worker loop until the process is stopped
///
/// Each iteration sweeps expired records, then claims and executes at most
/// one job. An empty queue backs off for the configured poll interval.
pub async fn run_worker(ctx: &AppContext) -> Result<(), NewsrakeError> {
    tracing::info!(
        "Worker started (tasks: {})",
        ctx.registry.task_names().join(", ")
    );
    let poll_interval = Duration::from_millis(ctx.config.broker.poll_interval_ms);

    loop {
        {
            let mut store = ctx.store.lock().unwrap();
            if let Err(e) = store.purge_expired() {
                tracing::warn!("Failed to purge expired jobs: {}", e);
            }
        }

        match run_next_job(ctx).await? {
            Some(job_id) => {
                tracing::debug!("Finished job {}", job_id);
            }
            None => {
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

/// Claims and executes the oldest pending job, if any
///
/// Returns the id of the job that ran, or None when the queue was empty.
/// The terminal record is written before cleanup is scheduled, so a cleanup
/// hiccup can never affect the recorded outcome.
pub async fn run_next_job(ctx: &AppContext) -> Result<Option<String>, NewsrakeError> {
    let claimed = {
        let mut store = ctx.store.lock().unwrap();
        store.claim_pending()?
    };

    let job = match claimed {
        Some(job) => job,
        None => return Ok(None),
    };
    tracing::info!("Claimed job {} (task: {})", job.id, job.task);

    match ctx.registry.lookup(&job.task) {
        None => {
            // Dispatch validates names, but records may outlive a deploy
            // that dropped a task.
            tracing::error!("Job {} names unknown task '{}'", job.id, job.task);
            ctx.tracker.finalize_failure(
                &job.id,
                &format!("no handler registered for task '{}'", job.task),
            )?;
        }
        Some(handler) => match handler(ctx, &job).await {
            Ok(summary) => {
                ctx.tracker.finalize_success(&job.id, &summary)?;
                if let Some(artifact) = &summary.artifact_path {
                    ctx.cleanup.on_job_complete(
                        &job.id,
                        Path::new(artifact),
                        ctx.config.broker.retention_secs,
                    );
                }
            }
            Err(e) => {
                tracing::error!("Job {} failed: {}", job.id, e);
                ctx.tracker.finalize_failure(&job.id, &e.to_string())?;
            }
        },
    }

    Ok(Some(job.id))
}

//! SQLite job store implementation
//!
//! This module provides the SQLite-based implementation of the JobStore
//! trait. Retention expiry is lazy: any read that touches a terminal record
//! older than the retention window deletes it and reports it absent.

use crate::crawler::CrawlSummary;
use crate::state::JobState;
use crate::store::schema::initialize_schema;
use crate::store::traits::{JobStore, StoreError, StoreResult};
use crate::store::JobRecord;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

/// SQLite job store backend
pub struct SqliteJobStore {
    conn: Connection,
    retention: Duration,
}

impl SqliteJobStore {
    /// Creates a new SqliteJobStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `retention_secs` - How long terminal records stay queryable
    pub fn new(path: &Path, retention_secs: u64) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            retention: Duration::seconds(retention_secs.min(i64::MAX as u64) as i64),
        })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn new_in_memory(retention_secs: u64) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            retention: Duration::seconds(retention_secs as i64),
        })
    }

    /// Reads a row without applying retention expiry
    fn get_raw(&self, id: &str) -> StoreResult<Option<JobRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task, state, max_chars, progress, result, error,
             created_at, updated_at, completed_at
             FROM jobs WHERE id = ?1",
        )?;

        let row = stmt
            .query_row(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, Option<String>>(9)?,
                ))
            })
            .optional()?;

        row.map(row_to_record).transpose()
    }

    /// True when a record is terminal and older than the retention window
    fn is_expired(&self, record: &JobRecord) -> bool {
        if !record.state.is_terminal() {
            return false;
        }
        match record.completed_at {
            Some(completed_at) => Utc::now() - completed_at >= self.retention,
            None => false,
        }
    }

    fn delete(&mut self, id: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Loads a record and checks that `next` is a legal successor state
    fn load_for_transition(&mut self, id: &str, next: JobState) -> StoreResult<JobRecord> {
        let record = self
            .get(id)?
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;

        if record.state.is_terminal() {
            return Err(StoreError::TerminalOverwrite {
                id: record.id,
                state: record.state,
            });
        }
        if !record.state.can_transition(next) {
            return Err(StoreError::InvalidTransition {
                from: record.state,
                to: next,
            });
        }

        Ok(record)
    }
}

impl JobStore for SqliteJobStore {
    fn submit(&mut self, task: &str, max_chars: Option<u64>) -> StoreResult<JobRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO jobs (id, task, state, max_chars, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                id,
                task,
                JobState::Pending.to_db_string(),
                max_chars.map(|m| m as i64),
                now
            ],
        )?;

        self.get_raw(&id)?
            .ok_or_else(|| StoreError::JobNotFound(id))
    }

    fn exists(&mut self, id: &str) -> StoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    fn get(&mut self, id: &str) -> StoreResult<Option<JobRecord>> {
        match self.get_raw(id)? {
            Some(record) if self.is_expired(&record) => {
                tracing::debug!("Job {} expired from the store", record.id);
                self.delete(id)?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn claim_pending(&mut self) -> StoreResult<Option<JobRecord>> {
        let candidate: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM jobs WHERE state = ?1 ORDER BY created_at, id LIMIT 1",
                params![JobState::Pending.to_db_string()],
                |row| row.get(0),
            )
            .optional()?;

        let id = match candidate {
            Some(id) => id,
            None => return Ok(None),
        };

        // Guarded update: a concurrent claimer loses the race and gets None.
        let now = Utc::now().to_rfc3339();
        let claimed = self.conn.execute(
            "UPDATE jobs SET state = ?1, updated_at = ?2 WHERE id = ?3 AND state = ?4",
            params![
                JobState::Started.to_db_string(),
                now,
                id,
                JobState::Pending.to_db_string()
            ],
        )?;

        if claimed == 0 {
            return Ok(None);
        }

        self.get_raw(&id)
    }

    fn set_progress(&mut self, id: &str, progress: &serde_json::Value) -> StoreResult<()> {
        self.load_for_transition(id, JobState::InProgress)?;

        let encoded = serde_json::to_string(progress)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "UPDATE jobs SET state = ?1, progress = ?2, updated_at = ?3 WHERE id = ?4",
            params![JobState::InProgress.to_db_string(), encoded, now, id],
        )?;
        Ok(())
    }

    fn complete(&mut self, id: &str, summary: &CrawlSummary) -> StoreResult<()> {
        self.load_for_transition(id, JobState::Success)?;

        let encoded = serde_json::to_string(summary)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "UPDATE jobs SET state = ?1, result = ?2, updated_at = ?3, completed_at = ?3
             WHERE id = ?4",
            params![JobState::Success.to_db_string(), encoded, now, id],
        )?;
        Ok(())
    }

    fn fail(&mut self, id: &str, error: &str) -> StoreResult<()> {
        self.load_for_transition(id, JobState::Failure)?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE jobs SET state = ?1, error = ?2, updated_at = ?3, completed_at = ?3
             WHERE id = ?4",
            params![JobState::Failure.to_db_string(), error, now, id],
        )?;
        Ok(())
    }

    fn purge_expired(&mut self) -> StoreResult<u64> {
        let mut stmt = self.conn.prepare(
            "SELECT id, completed_at FROM jobs WHERE state IN (?1, ?2) AND completed_at IS NOT NULL",
        )?;

        let rows = stmt.query_map(
            params![
                JobState::Success.to_db_string(),
                JobState::Failure.to_db_string()
            ],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            },
        )?;

        let now = Utc::now();
        let mut expired = Vec::new();
        for row in rows {
            let (id, completed_at) = row?;
            let completed_at = parse_timestamp(&completed_at)?;
            if now - completed_at >= self.retention {
                expired.push(id);
            }
        }
        drop(stmt);

        let count = expired.len() as u64;
        for id in expired {
            self.conn
                .execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        }

        if count > 0 {
            tracing::debug!("Purged {} expired job records", count);
        }
        Ok(count)
    }
}

type RawRow = (
    String,
    String,
    String,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
    Option<String>,
);

fn row_to_record(row: RawRow) -> StoreResult<JobRecord> {
    let (id, task, state, max_chars, progress, result, error, created_at, updated_at, completed_at) =
        row;

    let state = JobState::from_db_string(&state)
        .ok_or_else(|| StoreError::Database(format!("unknown job state '{}'", state)))?;

    let progress = progress
        .map(|p| serde_json::from_str(&p))
        .transpose()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let result = result
        .map(|r| serde_json::from_str(&r))
        .transpose()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(JobRecord {
        id,
        task,
        state,
        max_chars: max_chars.map(|m| m as u64),
        progress,
        result,
        error,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

fn parse_timestamp(s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_SECS: u64 = 86_400;

    fn sample_summary() -> CrawlSummary {
        CrawlSummary {
            artifact_path: Some("/tmp/out/test_articles_1700000000.csv".to_string()),
            message: "Crawl completed in 1.50 seconds.".to_string(),
            stopped_early: false,
            articles_written: 3,
            chars_written: 420,
            elapsed_secs: 1.5,
        }
    }

    #[test]
    fn test_submit_creates_pending_record() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let record = store.submit("crawl_articles", Some(1000)).unwrap();

        assert_eq!(record.state, JobState::Pending);
        assert_eq!(record.task, "crawl_articles");
        assert_eq!(record.max_chars, Some(1000));
        assert!(record.progress.is_none());
        assert!(record.result.is_none());
        assert!(record.completed_at.is_none());
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let a = store.submit("crawl_articles", None).unwrap();
        let b = store.submit("crawl_articles", None).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_unknown_id_not_found() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        assert!(!store.exists("no-such-id").unwrap());
        assert!(store.get("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_claim_moves_pending_to_started() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let submitted = store.submit("crawl_articles", None).unwrap();

        let claimed = store.claim_pending().unwrap().unwrap();
        assert_eq!(claimed.id, submitted.id);
        assert_eq!(claimed.state, JobState::Started);

        // Nothing left to claim.
        assert!(store.claim_pending().unwrap().is_none());
    }

    #[test]
    fn test_claim_is_oldest_first() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let first = store.submit("crawl_articles", None).unwrap();
        let _second = store.submit("crawl_articles", None).unwrap();

        let claimed = store.claim_pending().unwrap().unwrap();
        assert_eq!(claimed.id, first.id);
    }

    #[test]
    fn test_progress_updates_are_visible() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let job = store.submit("crawl_articles", None).unwrap();
        store.claim_pending().unwrap().unwrap();

        store
            .set_progress(&job.id, &serde_json::json!({"source_index": 0}))
            .unwrap();
        store
            .set_progress(&job.id, &serde_json::json!({"source_index": 2}))
            .unwrap();

        let record = store.get(&job.id).unwrap().unwrap();
        assert_eq!(record.state, JobState::InProgress);
        assert_eq!(record.progress.unwrap()["source_index"], 2);
    }

    #[test]
    fn test_complete_records_result() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let job = store.submit("crawl_articles", None).unwrap();
        store.claim_pending().unwrap().unwrap();

        store.complete(&job.id, &sample_summary()).unwrap();

        let record = store.get(&job.id).unwrap().unwrap();
        assert_eq!(record.state, JobState::Success);
        assert_eq!(record.result.unwrap(), sample_summary());
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_terminal_record_is_immutable() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let job = store.submit("crawl_articles", None).unwrap();
        store.claim_pending().unwrap().unwrap();
        store.complete(&job.id, &sample_summary()).unwrap();

        let again = store.complete(&job.id, &sample_summary());
        assert!(matches!(
            again.unwrap_err(),
            StoreError::TerminalOverwrite { .. }
        ));

        let fail = store.fail(&job.id, "too late");
        assert!(matches!(
            fail.unwrap_err(),
            StoreError::TerminalOverwrite { .. }
        ));

        let progress = store.set_progress(&job.id, &serde_json::json!({}));
        assert!(matches!(
            progress.unwrap_err(),
            StoreError::TerminalOverwrite { .. }
        ));
    }

    #[test]
    fn test_repeated_reads_return_same_terminal_payload() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let job = store.submit("crawl_articles", None).unwrap();
        store.claim_pending().unwrap().unwrap();
        store.fail(&job.id, "sink went away").unwrap();

        for _ in 0..3 {
            let record = store.get(&job.id).unwrap().unwrap();
            assert_eq!(record.state, JobState::Failure);
            assert_eq!(record.error.as_deref(), Some("sink went away"));
        }
    }

    #[test]
    fn test_terminal_record_expires_after_retention() {
        // Zero retention: terminal records expire on the next read.
        let mut store = SqliteJobStore::new_in_memory(0).unwrap();
        let job = store.submit("crawl_articles", None).unwrap();
        store.claim_pending().unwrap().unwrap();
        store.complete(&job.id, &sample_summary()).unwrap();

        assert!(!store.exists(&job.id).unwrap());
        assert!(store.get(&job.id).unwrap().is_none());
    }

    #[test]
    fn test_active_record_never_expires() {
        let mut store = SqliteJobStore::new_in_memory(0).unwrap();
        let job = store.submit("crawl_articles", None).unwrap();

        // Pending despite zero retention: expiry only applies to terminal states.
        assert!(store.exists(&job.id).unwrap());
        let record = store.get(&job.id).unwrap().unwrap();
        assert_eq!(record.state, JobState::Pending);
    }

    #[test]
    fn test_purge_expired_sweeps_terminal_records() {
        let mut store = SqliteJobStore::new_in_memory(0).unwrap();

        let done = store.submit("crawl_articles", None).unwrap();
        store.claim_pending().unwrap().unwrap();
        store.complete(&done.id, &sample_summary()).unwrap();

        let pending = store.submit("crawl_articles", None).unwrap();

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(store.exists(&pending.id).unwrap());
        assert_eq!(store.purge_expired().unwrap(), 0);
    }

    #[test]
    fn test_purge_keeps_unexpired_terminal_records() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let job = store.submit("crawl_articles", None).unwrap();
        store.claim_pending().unwrap().unwrap();
        store.complete(&job.id, &sample_summary()).unwrap();

        assert_eq!(store.purge_expired().unwrap(), 0);
        assert!(store.exists(&job.id).unwrap());
    }

    #[test]
    fn test_set_progress_on_unknown_job() {
        let mut store = SqliteJobStore::new_in_memory(DAY_SECS).unwrap();
        let result = store.set_progress("no-such-id", &serde_json::json!({}));
        assert!(matches!(result.unwrap_err(), StoreError::JobNotFound(_)));
    }
}

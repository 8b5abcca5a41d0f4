//! Status query mapper
//!
//! A pure mapping from a job snapshot to the client-facing response shape.
//! No side effects; calling it any number of times for the same snapshot
//! yields the same response.

use crate::crawler::CrawlSummary;
use crate::jobs::JobSnapshot;
use serde::Serialize;

/// Client-facing view of one status query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    /// HTTP-style response code: 200, 202, 404, or 500
    #[serde(skip)]
    pub code: u16,

    pub job_id: String,

    /// Upper-case state label: NOT_FOUND, PENDING, STARTED, IN_PROGRESS,
    /// SUCCESS, or FAILURE
    pub status: &'static str,

    /// Success payload; present only with code 200
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CrawlSummary>,

    /// Failure description; present only with code 500
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Most recent progress snapshot; optionally present with code 202
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<serde_json::Value>,
}

/// Maps a snapshot to its response
///
/// NotFound maps to 404, Success to 200 with the result payload, Failure to
/// 500 with the error string, and every active state to 202.
pub fn map_status(job_id: &str, snapshot: &JobSnapshot) -> StatusResponse {
    let job_id = job_id.to_string();
    match snapshot {
        JobSnapshot::NotFound => StatusResponse {
            code: 404,
            job_id,
            status: "NOT_FOUND",
            result: None,
            error: None,
            progress: None,
        },
        JobSnapshot::Pending => StatusResponse {
            code: 202,
            job_id,
            status: "PENDING",
            result: None,
            error: None,
            progress: None,
        },
        JobSnapshot::Started => StatusResponse {
            code: 202,
            job_id,
            status: "STARTED",
            result: None,
            error: None,
            progress: None,
        },
        JobSnapshot::InProgress { progress } => StatusResponse {
            code: 202,
            job_id,
            status: "IN_PROGRESS",
            result: None,
            error: None,
            progress: progress.clone(),
        },
        JobSnapshot::Success { result } => StatusResponse {
            code: 200,
            job_id,
            status: "SUCCESS",
            result: Some(result.clone()),
            error: None,
            progress: None,
        },
        JobSnapshot::Failure { error } => StatusResponse {
            code: 500,
            job_id,
            status: "FAILURE",
            result: None,
            error: Some(error.clone()),
            progress: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> CrawlSummary {
        CrawlSummary {
            artifact_path: Some("/tmp/out/test_articles_1700000000.csv".to_string()),
            message: "Crawl completed in 2.00 seconds.".to_string(),
            stopped_early: false,
            articles_written: 5,
            chars_written: 900,
            elapsed_secs: 2.0,
        }
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = map_status("abc", &JobSnapshot::NotFound);
        assert_eq!(response.code, 404);
        assert_eq!(response.status, "NOT_FOUND");
        assert!(response.result.is_none());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_pending_and_started_map_to_202() {
        assert_eq!(map_status("abc", &JobSnapshot::Pending).code, 202);
        assert_eq!(map_status("abc", &JobSnapshot::Started).code, 202);
        assert_eq!(map_status("abc", &JobSnapshot::Pending).status, "PENDING");
        assert_eq!(map_status("abc", &JobSnapshot::Started).status, "STARTED");
    }

    #[test]
    fn test_in_progress_carries_progress() {
        let snapshot = JobSnapshot::InProgress {
            progress: Some(serde_json::json!({"source_index": 1})),
        };
        let response = map_status("abc", &snapshot);
        assert_eq!(response.code, 202);
        assert_eq!(response.status, "IN_PROGRESS");
        assert_eq!(response.progress.unwrap()["source_index"], 1);
    }

    #[test]
    fn test_success_maps_to_200_with_result() {
        let snapshot = JobSnapshot::Success {
            result: sample_summary(),
        };
        let response = map_status("abc", &snapshot);
        assert_eq!(response.code, 200);
        assert_eq!(response.status, "SUCCESS");
        assert_eq!(response.result.unwrap(), sample_summary());
    }

    #[test]
    fn test_failure_maps_to_500_with_error() {
        let snapshot = JobSnapshot::Failure {
            error: "sink I/O error".to_string(),
        };
        let response = map_status("abc", &snapshot);
        assert_eq!(response.code, 500);
        assert_eq!(response.status, "FAILURE");
        assert_eq!(response.error.as_deref(), Some("sink I/O error"));
    }

    #[test]
    fn test_mapping_is_repeatable() {
        let snapshot = JobSnapshot::Success {
            result: sample_summary(),
        };
        let first = map_status("abc", &snapshot);
        let second = map_status("abc", &snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let body = serde_json::to_value(map_status("abc", &JobSnapshot::Pending)).unwrap();
        assert_eq!(body["job_id"], "abc");
        assert_eq!(body["status"], "PENDING");
        assert!(body.get("result").is_none());
        assert!(body.get("error").is_none());
        assert!(body.get("progress").is_none());
        // The transport code never appears in the body.
        assert!(body.get("code").is_none());
    }
}

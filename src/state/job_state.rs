/// Job state definitions for tracking background crawl jobs
///
/// This module defines all possible states a job can be in between submission
/// and expiry from the job store.
use std::fmt;

/// Represents the current state of a job in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    // ===== Active States =====
    /// Job has been submitted but no worker has claimed it yet
    Pending,

    /// A worker has claimed the job and is about to run it
    Started,

    /// The worker is running and has reported progress at least once
    InProgress,

    // ===== Terminal States =====
    /// Job finished and produced a result payload
    Success,

    /// Job finished with an error description
    Failure,
}

impl JobState {
    /// Returns true if this is a terminal state (no further writes allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    /// Returns true if this is an active state (the job may still be running)
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if a transition from this state to `next` preserves the
    /// non-decreasing lifecycle ordering
    ///
    /// Observed sequences must follow Pending -> (Started/InProgress)* ->
    /// {Success | Failure}. Terminal states accept no successor; InProgress
    /// may repeat as the worker pushes fresh progress snapshots.
    pub fn can_transition(&self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobState::InProgress && *self == JobState::InProgress {
            return true;
        }
        next.rank() > self.rank()
    }

    /// Ordering rank used for monotonicity checks
    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Started => 1,
            Self::InProgress => 2,
            Self::Success | Self::Failure => 3,
        }
    }

    /// Converts the job state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Started => "started",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    /// Parses a job state from a database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "started" => Some(Self::Started),
            "in_progress" => Some(Self::InProgress),
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            _ => None,
        }
    }

    /// Returns all possible job states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Started,
            Self::InProgress,
            Self::Success,
            Self::Failure,
        ]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

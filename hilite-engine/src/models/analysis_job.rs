//! Analysis job record
//!
//! One [`AnalysisJob`] exists per submitted video URL. It is replaced,
//! never reused, when a new URL is submitted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use hilite_common::events::JobState;

/// State transition record
#[derive(Debug, Clone, Serialize)]
pub struct StateTransition {
    pub job_id: Uuid,
    pub old_state: JobState,
    pub new_state: JobState,
    pub transitioned_at: DateTime<Utc>,
}

/// Analysis job (in-memory state)
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisJob {
    /// Identity used to reject responses from superseded jobs
    pub job_id: Uuid,

    /// Video URL this job analyses
    pub url: String,

    /// Current lifecycle state
    pub state: JobState,

    /// Status polls issued so far
    pub attempt_count: u32,

    /// Whether the one allowed re-submission has been spent
    pub resubmitted: bool,

    /// Ask the backend to ignore cached results
    pub force_fresh: bool,

    /// Backend key used for status polls
    pub job_key: Option<String>,

    /// Latest progress or error text
    pub last_message: Option<String>,

    /// Latest backend stage (downloading, analysis_start, ...)
    pub stage: Option<String>,

    /// Audio highlight times once the job succeeded
    pub result: Option<Vec<f64>>,

    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl AnalysisJob {
    /// Create new job in the `Idle` state
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            url: url.into(),
            state: JobState::Idle,
            attempt_count: 0,
            resubmitted: false,
            force_fresh: false,
            job_key: None,
            last_message: None,
            stage: None,
            result: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: JobState) -> StateTransition {
        let transition = StateTransition {
            job_id: self.job_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        if new_state.is_terminal() {
            self.ended_at = Some(Utc::now());
        }

        transition
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Seconds since the job was created (or until it ended)
    pub fn elapsed_seconds(&self) -> i64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_idle() {
        let job = AnalysisJob::new("https://youtu.be/abc");
        assert_eq!(job.state, JobState::Idle);
        assert_eq!(job.attempt_count, 0);
        assert!(job.result.is_none());
        assert!(job.ended_at.is_none());
    }

    #[test]
    fn test_terminal_transition_sets_end_time() {
        let mut job = AnalysisJob::new("https://youtu.be/abc");
        let t = job.transition_to(JobState::Requesting);
        assert_eq!(t.old_state, JobState::Idle);
        assert!(job.ended_at.is_none());

        job.transition_to(JobState::Error);
        assert!(job.is_terminal());
        assert!(job.ended_at.is_some());
    }

    #[test]
    fn test_jobs_have_distinct_ids() {
        let a = AnalysisJob::new("u");
        let b = AnalysisJob::new("u");
        assert_ne!(a.job_id, b.job_id);
    }
}

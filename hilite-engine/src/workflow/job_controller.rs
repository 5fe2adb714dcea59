//! Analysis job state machine
//!
//! Pure and synchronous: every method takes the identity of the job a
//! response belongs to and returns the next [`JobAction`] for the driver.
//! Responses for any job other than the active one are ignored, which is
//! what keeps a superseded job from touching its successor.
//!
//! ```text
//! Idle → Requesting ─┬→ Success
//!                    ├→ Error
//!                    └→ Processing ─┬→ Processing (poll again)
//!                                   ├→ Success | Error
//!                                   ├→ Requesting (backend lost the job, once)
//!                                   └→ TimedOut (attempt bound reached)
//! ```

use crate::error::EngineError;
use crate::models::{AnalysisJob, JobState, StateTransition};
use crate::services::{AnalysisResponse, AnalysisStatus};
use hilite_common::config::EngineSettings;
use std::time::Duration;
use uuid::Uuid;

/// What the driver should do next
#[derive(Debug, Clone, PartialEq)]
pub enum JobAction {
    /// Issue the initial analysis request
    Submit {
        job_id: Uuid,
        url: String,
        force_fresh: bool,
    },
    /// Query job status after `delay`
    Poll {
        job_id: Uuid,
        job_key: String,
        delay: Duration,
    },
    /// Job reached a terminal state
    Finished { job_id: Uuid, state: JobState },
    /// Response belonged to a superseded or finished job
    Ignored,
}

/// Drives at most one [`AnalysisJob`] at a time
#[derive(Debug)]
pub struct JobController {
    poll_interval: Duration,
    max_poll_attempts: u32,
    job: Option<AnalysisJob>,
    transitions: Vec<StateTransition>,
}

impl JobController {
    pub fn new(poll_interval: Duration, max_poll_attempts: u32) -> Self {
        Self {
            poll_interval,
            max_poll_attempts,
            job: None,
            transitions: Vec::new(),
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.poll_interval(), settings.max_poll_attempts)
    }

    pub fn max_poll_attempts(&self) -> u32 {
        self.max_poll_attempts
    }

    /// Active (or most recently finished) job
    pub fn job(&self) -> Option<&AnalysisJob> {
        self.job.as_ref()
    }

    /// True if `job_id` is the job currently held
    pub fn is_current(&self, job_id: Uuid) -> bool {
        self.job.as_ref().map(|j| j.job_id) == Some(job_id)
    }

    /// Start a job for `url`, replacing any existing one
    ///
    /// `job_key` is the poll key used until the backend hands out its own.
    pub fn submit(&mut self, url: &str, job_key: &str, force_fresh: bool) -> JobAction {
        self.cancel();

        let mut job = AnalysisJob::new(url);
        job.job_key = Some(job_key.to_string());
        job.force_fresh = force_fresh;

        let transition = job.transition_to(JobState::Requesting);
        self.transitions.push(transition);

        tracing::info!(job_id = %job.job_id, url = %url, "Analysis job submitted");

        let action = JobAction::Submit {
            job_id: job.job_id,
            url: job.url.clone(),
            force_fresh,
        };
        self.job = Some(job);
        action
    }

    /// Drop the active job; later responses for it are ignored
    pub fn cancel(&mut self) -> Option<Uuid> {
        let job = self.job.take()?;
        if !job.is_terminal() {
            tracing::info!(
                job_id = %job.job_id,
                state = %job.state,
                attempts = job.attempt_count,
                "Analysis job cancelled"
            );
        }
        Some(job.job_id)
    }

    /// Apply the response to the initial (or repeated) analysis request
    pub fn apply_submit_response(&mut self, job_id: Uuid, response: &AnalysisResponse) -> JobAction {
        let Some(job) = self.active_job(job_id, JobState::Requesting) else {
            return JobAction::Ignored;
        };

        if let Some(key) = &response.cache_key {
            job.job_key = Some(key.clone());
        }
        record_progress(job, response);

        match response.status {
            AnalysisStatus::Success => self.finish_success(response),
            AnalysisStatus::Processing => {
                self.transition(JobState::Processing);
                self.schedule_poll()
            }
            AnalysisStatus::Error => self.finish(JobState::Error),
            AnalysisStatus::NotStarted => {
                if let Some(job) = self.job.as_mut() {
                    job.last_message = Some("Backend did not accept the analysis request".to_string());
                }
                self.finish(JobState::Error)
            }
        }
    }

    /// Apply a status poll response
    pub fn apply_poll_response(&mut self, job_id: Uuid, response: &AnalysisResponse) -> JobAction {
        let Some(job) = self.active_job(job_id, JobState::Processing) else {
            return JobAction::Ignored;
        };
        record_progress(job, response);

        match response.status {
            AnalysisStatus::Processing => self.schedule_poll(),
            AnalysisStatus::Success => self.finish_success(response),
            AnalysisStatus::Error => self.finish(JobState::Error),
            AnalysisStatus::NotStarted => self.resubmit(),
        }
    }

    /// Apply a transport failure for the pending request
    ///
    /// A failed initial request ends the job. A failed status check is
    /// treated as still processing and counts toward the attempt bound.
    pub fn apply_failure(&mut self, job_id: Uuid, message: &str) -> JobAction {
        let Some(job) = self.job.as_mut().filter(|j| j.job_id == job_id && !j.is_terminal()) else {
            return JobAction::Ignored;
        };
        job.last_message = Some(message.to_string());
        let state = job.state;

        match state {
            JobState::Requesting => self.finish(JobState::Error),
            JobState::Processing => {
                tracing::warn!(job_id = %job_id, error = %message, "Status check failed");
                self.schedule_poll()
            }
            _ => JobAction::Ignored,
        }
    }

    /// Transitions recorded since the last call
    pub fn take_transitions(&mut self) -> Vec<StateTransition> {
        std::mem::take(&mut self.transitions)
    }

    /// User-visible error for a failed or timed-out job
    pub fn error(&self) -> Option<EngineError> {
        let job = self.job.as_ref()?;
        match job.state {
            JobState::Error => Some(EngineError::Job(
                job.last_message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            )),
            JobState::TimedOut => Some(EngineError::Timeout {
                attempts: job.attempt_count,
            }),
            _ => None,
        }
    }

    fn active_job(&mut self, job_id: Uuid, expected: JobState) -> Option<&mut AnalysisJob> {
        match self.job.as_mut() {
            Some(job) if job.job_id == job_id && job.state == expected => Some(job),
            Some(job) => {
                tracing::debug!(
                    job_id = %job_id,
                    active_job = %job.job_id,
                    state = %job.state,
                    "Ignoring stale analysis response"
                );
                None
            }
            None => {
                tracing::debug!(job_id = %job_id, "Ignoring response for cancelled job");
                None
            }
        }
    }

    fn transition(&mut self, new_state: JobState) {
        if let Some(job) = self.job.as_mut() {
            if job.state != new_state {
                let transition = job.transition_to(new_state);
                self.transitions.push(transition);
            }
        }
    }

    fn schedule_poll(&mut self) -> JobAction {
        let Some(job) = self.job.as_mut() else {
            return JobAction::Ignored;
        };

        if job.attempt_count >= self.max_poll_attempts {
            tracing::warn!(
                job_id = %job.job_id,
                attempts = job.attempt_count,
                "Analysis polling exhausted its attempt bound"
            );
            job.last_message = Some(
                EngineError::Timeout {
                    attempts: job.attempt_count,
                }
                .to_string(),
            );
            return self.finish(JobState::TimedOut);
        }

        job.attempt_count += 1;
        JobAction::Poll {
            job_id: job.job_id,
            job_key: job.job_key.clone().unwrap_or_else(|| job.url.clone()),
            delay: self.poll_interval,
        }
    }

    fn resubmit(&mut self) -> JobAction {
        let Some(job) = self.job.as_mut() else {
            return JobAction::Ignored;
        };

        if job.resubmitted {
            job.last_message = Some("Analysis job was lost by the backend".to_string());
            return self.finish(JobState::Error);
        }

        job.resubmitted = true;
        tracing::info!(
            job_id = %job.job_id,
            attempts = job.attempt_count,
            "Backend lost analysis job, re-submitting once"
        );
        let action = JobAction::Submit {
            job_id: job.job_id,
            url: job.url.clone(),
            force_fresh: job.force_fresh,
        };
        self.transition(JobState::Requesting);
        action
    }

    fn finish_success(&mut self, response: &AnalysisResponse) -> JobAction {
        if let Some(job) = self.job.as_mut() {
            job.result = Some(response.highlights.clone().unwrap_or_default());
        }
        self.finish(JobState::Success)
    }

    fn finish(&mut self, state: JobState) -> JobAction {
        self.transition(state);
        match self.job.as_ref() {
            Some(job) => {
                tracing::info!(
                    job_id = %job.job_id,
                    state = %state,
                    attempts = job.attempt_count,
                    elapsed_s = job.elapsed_seconds(),
                    "Analysis job finished"
                );
                JobAction::Finished {
                    job_id: job.job_id,
                    state,
                }
            }
            None => JobAction::Ignored,
        }
    }
}

fn record_progress(job: &mut AnalysisJob, response: &AnalysisResponse) {
    if let Some(message) = response.display_message() {
        job.last_message = Some(message);
    }
    if let Some(stage) = &response.stage {
        job.stage = Some(stage.clone());
    }
}

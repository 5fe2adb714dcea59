//! Async driver for the analysis job state machine
//!
//! Performs the I/O a [`JobAction`] asks for and feeds the outcome back into
//! the [`JobController`]. Waiting between polls goes through a [`Scheduler`]
//! so tests can run the whole polling sequence without wall-clock delays.

use super::job_controller::{JobAction, JobController};
use crate::models::AnalysisJob;
use crate::services::AnalysisService;
use async_trait::async_trait;
use hilite_common::events::{EventBus, HighlightEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Source of delays between status polls
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Real-time scheduler backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Runs analysis jobs against an [`AnalysisService`]
#[derive(Clone)]
pub struct JobRunner {
    controller: Arc<Mutex<JobController>>,
    service: Arc<dyn AnalysisService>,
    scheduler: Arc<dyn Scheduler>,
    event_bus: EventBus,
}

impl JobRunner {
    pub fn new(
        controller: JobController,
        service: Arc<dyn AnalysisService>,
        scheduler: Arc<dyn Scheduler>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            service,
            scheduler,
            event_bus,
        }
    }

    /// Snapshot of the active (or last finished) job
    pub async fn job(&self) -> Option<AnalysisJob> {
        self.controller.lock().await.job().cloned()
    }

    /// User-visible job error, if the job failed or timed out
    pub async fn error(&self) -> Option<crate::error::EngineError> {
        self.controller.lock().await.error()
    }

    /// Replace any active job with one for `url`
    pub async fn start(&self, url: &str, job_key: &str, force_fresh: bool) -> JobAction {
        let mut controller = self.controller.lock().await;
        let action = controller.submit(url, job_key, force_fresh);
        self.publish(&mut controller);
        action
    }

    /// Stop the active job; in-flight responses for it are dropped
    pub async fn cancel(&self) {
        let mut controller = self.controller.lock().await;
        controller.cancel();
    }

    /// Drive `action` until the job finishes, is superseded or `cancel` fires
    ///
    /// Returns the finished job, or `None` when the job did not finish as
    /// the active job.
    pub async fn drive(&self, mut action: JobAction, cancel: CancellationToken) -> Option<AnalysisJob> {
        loop {
            action = match action {
                JobAction::Submit {
                    job_id,
                    url,
                    force_fresh,
                } => {
                    let response = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return None,
                        response = self.service.submit(&url, force_fresh) => response,
                    };

                    let mut controller = self.controller.lock().await;
                    let next = match response {
                        Ok(response) => controller.apply_submit_response(job_id, &response),
                        Err(e) => controller.apply_failure(job_id, &e.to_string()),
                    };
                    self.publish(&mut controller);
                    next
                }

                JobAction::Poll {
                    job_id,
                    job_key,
                    delay,
                } => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return None,
                        _ = self.scheduler.sleep(delay) => {}
                    }

                    let response = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return None,
                        response = self.service.poll(&job_key) => response,
                    };

                    let mut controller = self.controller.lock().await;
                    let next = match response {
                        Ok(response) => controller.apply_poll_response(job_id, &response),
                        Err(e) => controller.apply_failure(job_id, &e.to_string()),
                    };
                    self.publish(&mut controller);
                    if matches!(next, JobAction::Poll { .. }) {
                        self.publish_progress(&controller);
                    }
                    next
                }

                JobAction::Finished { job_id, .. } => {
                    let controller = self.controller.lock().await;
                    return controller.job().filter(|job| job.job_id == job_id).cloned();
                }

                JobAction::Ignored => return None,
            };
        }
    }

    fn publish(&self, controller: &mut JobController) {
        let message = controller.job().and_then(|job| job.last_message.clone());
        for transition in controller.take_transitions() {
            tracing::info!(
                job_id = %transition.job_id,
                old_state = %transition.old_state,
                new_state = %transition.new_state,
                "Analysis job state changed"
            );
            self.event_bus.emit_lossy(HighlightEvent::JobStateChanged {
                job_id: transition.job_id,
                old_state: transition.old_state,
                new_state: transition.new_state,
                message: message.clone(),
                timestamp: transition.transitioned_at,
            });
        }
    }

    fn publish_progress(&self, controller: &JobController) {
        if let Some(job) = controller.job() {
            let max_attempts = controller.max_poll_attempts();
            tracing::debug!(
                job_id = %job.job_id,
                attempt = job.attempt_count,
                max_attempts,
                stage = ?job.stage,
                "Analysis still processing"
            );
            self.event_bus.emit_lossy(HighlightEvent::JobProgress {
                job_id: job.job_id,
                attempt: job.attempt_count,
                max_attempts,
                stage: job.stage.clone(),
                message: job.last_message.clone(),
            });
        }
    }
}

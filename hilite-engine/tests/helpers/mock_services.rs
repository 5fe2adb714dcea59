//! Scripted stand-ins for the external services

use async_trait::async_trait;
use hilite_engine::highlight::CommentItem;
use hilite_engine::services::{
    AnalysisResponse, AnalysisService, CommentSource, HeatmapHighlights, HeatmapService,
    ServiceError,
};
use hilite_engine::workflow::Scheduler;
use hilite_engine::VideoId;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Scheduler that never waits
pub struct ImmediateScheduler;

#[async_trait]
impl Scheduler for ImmediateScheduler {
    async fn sleep(&self, _delay: Duration) {
        tokio::task::yield_now().await;
    }
}

/// Analysis backend answering from per-URL and per-key scripts
///
/// Unscripted submits fail with a network error; unscripted polls report
/// `processing` forever.
#[derive(Default)]
pub struct MockAnalysis {
    submits: Mutex<HashMap<String, VecDeque<AnalysisResponse>>>,
    polls: Mutex<HashMap<String, VecDeque<AnalysisResponse>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    cleared: Mutex<Vec<String>>,
}

impl MockAnalysis {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_submit(&self, url: &str, responses: Vec<AnalysisResponse>) {
        self.submits
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .extend(responses);
    }

    pub fn on_poll(&self, job_key: &str, responses: Vec<AnalysisResponse>) {
        self.polls
            .lock()
            .unwrap()
            .entry(job_key.to_string())
            .or_default()
            .extend(responses);
    }

    /// Hold every poll for `job_key` until the returned gate is notified
    pub fn gate_polls(&self, job_key: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(job_key.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn cleared(&self) -> Vec<String> {
        self.cleared.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisService for MockAnalysis {
    async fn submit(&self, url: &str, _force_fresh: bool) -> Result<AnalysisResponse, ServiceError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submits
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .ok_or_else(|| ServiceError::Network(format!("no scripted submit for {}", url)))
    }

    async fn poll(&self, job_key: &str) -> Result<AnalysisResponse, ServiceError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(job_key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        Ok(self
            .polls
            .lock()
            .unwrap()
            .get_mut(job_key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| AnalysisResponse::processing("working")))
    }

    async fn clear_cache(&self, url: &str) -> Result<String, ServiceError> {
        self.cleared.lock().unwrap().push(url.to_string());
        Ok(format!("Cleared cache for {}", url))
    }
}

/// Heatmap backend with one fixed answer
pub struct MockHeatmap {
    result: Result<HeatmapHighlights, String>,
}

impl MockHeatmap {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            result: Ok(HeatmapHighlights::default()),
        })
    }

    pub fn with(highlights: HeatmapHighlights) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(highlights),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
        })
    }
}

#[async_trait]
impl HeatmapService for MockHeatmap {
    async fn fetch(&self, _url: &str) -> Result<HeatmapHighlights, ServiceError> {
        self.result.clone().map_err(ServiceError::Rejected)
    }
}

/// Comment source that always fails
pub struct FailingCommentSource;

#[async_trait]
impl CommentSource for FailingCommentSource {
    async fn fetch_comments(&self, _video: &VideoId) -> Result<Vec<CommentItem>, ServiceError> {
        Err(ServiceError::Api(403, "comments disabled".to_string()))
    }
}

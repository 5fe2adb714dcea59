//! Highlight engine
//!
//! Wires the three highlight sources, the job runner, the merger and the
//! playback bridge together. Each submission gets a fresh generation id and
//! cancellation token; every source task checks both before writing its
//! slice, so results for a replaced video never reach the new one.

use super::job_runner::{JobRunner, Scheduler, TokioScheduler};
use super::job_controller::{JobAction, JobController};
use super::sync_bridge::PlaybackSyncBridge;
use crate::error::{EngineError, EngineResult};
use crate::highlight::{PriorityMerger, SourceNormalizer};
use crate::models::{AnalysisJob, HighlightCandidate, JobState, Marker};
use crate::services::{AnalysisService, CommentSource, HeatmapService};
use crate::video_id::VideoId;
use hilite_common::config::EngineSettings;
use hilite_common::events::{EventBus, HighlightEvent};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const SOURCE_COMMENTS: &str = "comments";
pub const SOURCE_HEATMAP: &str = "heatmap";
pub const SOURCE_AUDIO: &str = "audio";

const EVENT_CAPACITY: usize = 256;

/// External collaborators the engine talks to
#[derive(Clone)]
pub struct EngineServices {
    pub comments: Arc<dyn CommentSource>,
    pub analysis: Arc<dyn AnalysisService>,
    pub heatmap: Arc<dyn HeatmapService>,
    pub scheduler: Arc<dyn Scheduler>,
}

impl EngineServices {
    /// Services with the real-time scheduler
    pub fn new(
        comments: Arc<dyn CommentSource>,
        analysis: Arc<dyn AnalysisService>,
        heatmap: Arc<dyn HeatmapService>,
    ) -> Self {
        Self {
            comments,
            analysis,
            heatmap,
            scheduler: Arc::new(TokioScheduler),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }
}

/// A source that contributed no candidates this generation
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source_name: String,
    pub message: String,
}

impl From<&SourceFailure> for EngineError {
    fn from(failure: &SourceFailure) -> Self {
        EngineError::source_failed(failure.source_name.clone(), failure.message.clone())
    }
}

/// Point-in-time view of the engine
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub generation: Uuid,
    pub url: Option<String>,
    pub video_id: Option<VideoId>,
    pub markers: Vec<Marker>,
    pub job: Option<AnalysisJob>,
    pub failures: Vec<SourceFailure>,
}

#[derive(Debug, Clone, Copy)]
enum Slice {
    Comments,
    Heatmap,
    Audio,
}

struct EngineState {
    generation: Uuid,
    cancel: CancellationToken,
    url: Option<String>,
    video_id: Option<VideoId>,
    comment_candidates: Vec<HighlightCandidate>,
    heatmap_candidates: Vec<HighlightCandidate>,
    audio_candidates: Vec<HighlightCandidate>,
    markers: Vec<Marker>,
    failures: Vec<SourceFailure>,
    tasks: Vec<JoinHandle<()>>,
}

impl EngineState {
    fn new(generation: Uuid, cancel: CancellationToken) -> Self {
        Self {
            generation,
            cancel,
            url: None,
            video_id: None,
            comment_candidates: Vec::new(),
            heatmap_candidates: Vec::new(),
            audio_candidates: Vec::new(),
            markers: Vec::new(),
            failures: Vec::new(),
            tasks: Vec::new(),
        }
    }

    fn slice_mut(&mut self, slice: Slice) -> &mut Vec<HighlightCandidate> {
        match slice {
            Slice::Comments => &mut self.comment_candidates,
            Slice::Heatmap => &mut self.heatmap_candidates,
            Slice::Audio => &mut self.audio_candidates,
        }
    }

    fn all_candidates(&self) -> Vec<HighlightCandidate> {
        self.comment_candidates
            .iter()
            .chain(&self.heatmap_candidates)
            .chain(&self.audio_candidates)
            .cloned()
            .collect()
    }
}

struct EngineInner {
    state: RwLock<EngineState>,
    normalizer: SourceNormalizer,
    merger: PriorityMerger,
    comments: Arc<dyn CommentSource>,
    heatmap: Arc<dyn HeatmapService>,
    analysis: Arc<dyn AnalysisService>,
    jobs: JobRunner,
    bridge: PlaybackSyncBridge,
    event_bus: EventBus,
}

/// Highlight aggregation and synchronization engine
#[derive(Clone)]
pub struct HighlightEngine {
    inner: Arc<EngineInner>,
}

impl HighlightEngine {
    pub fn new(settings: &EngineSettings, services: EngineServices) -> Self {
        Self::with_event_bus(settings, services, EventBus::new(EVENT_CAPACITY))
    }

    pub fn with_event_bus(
        settings: &EngineSettings,
        services: EngineServices,
        event_bus: EventBus,
    ) -> Self {
        let jobs = JobRunner::new(
            JobController::from_settings(settings),
            Arc::clone(&services.analysis),
            services.scheduler,
            event_bus.clone(),
        );

        Self {
            inner: Arc::new(EngineInner {
                state: RwLock::new(EngineState::new(Uuid::new_v4(), CancellationToken::new())),
                normalizer: SourceNormalizer::from_settings(settings),
                merger: PriorityMerger::from_settings(settings),
                comments: services.comments,
                heatmap: services.heatmap,
                analysis: services.analysis,
                jobs,
                bridge: PlaybackSyncBridge::from_settings(settings, event_bus.clone()),
                event_bus,
            }),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn bridge(&self) -> &PlaybackSyncBridge {
        &self.inner.bridge
    }

    /// Load a new video, replacing everything about the previous one
    ///
    /// Returns the new generation id. An unrecognised URL is rejected
    /// before any state changes.
    pub async fn submit(&self, url: &str) -> EngineResult<Uuid> {
        self.submit_with(url, false).await
    }

    /// As [`submit`](Self::submit), optionally bypassing the analysis cache
    pub async fn submit_with(&self, url: &str, force_fresh: bool) -> EngineResult<Uuid> {
        let video_id = VideoId::parse(url)?;
        let url = url.trim().to_string();
        let generation = Uuid::new_v4();
        let cancel = CancellationToken::new();

        let mut state = self.inner.state.write().await;
        state.cancel.cancel();
        for task in state.tasks.drain(..) {
            task.abort();
        }
        *state = EngineState::new(generation, cancel.clone());
        state.url = Some(url.clone());
        state.video_id = Some(video_id.clone());

        tracing::info!(
            generation = %generation,
            url = %url,
            video_id = %video_id,
            "Video submitted"
        );
        self.inner.event_bus.emit_lossy(HighlightEvent::VideoSubmitted {
            generation,
            url: url.clone(),
            video_id: video_id.to_string(),
            timestamp: chrono::Utc::now(),
        });

        let action = self
            .inner
            .jobs
            .start(&video_id.watch_url(), video_id.as_str(), force_fresh)
            .await;
        self.inner.bridge.reset().await;

        state.tasks = vec![
            tokio::spawn(run_comments(
                Arc::clone(&self.inner),
                generation,
                video_id,
                cancel.clone(),
            )),
            tokio::spawn(run_heatmap(
                Arc::clone(&self.inner),
                generation,
                url,
                cancel.clone(),
            )),
            tokio::spawn(run_analysis(Arc::clone(&self.inner), generation, action, cancel)),
        ];

        Ok(generation)
    }

    /// Wait until every source task of the current generation has finished
    pub async fn settle(&self) {
        let tasks = std::mem::take(&mut self.inner.state.write().await.tasks);
        for task in tasks {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::error!(error = %e, "Highlight source task panicked");
                }
            }
        }
    }

    /// Stop all in-flight work and detach the playback surface
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.write().await;
        state.cancel.cancel();
        for task in state.tasks.drain(..) {
            task.abort();
        }
        self.inner.jobs.cancel().await;
        self.inner.bridge.detach().await;
        tracing::info!(generation = %state.generation, "Engine shut down");
    }

    /// Ask the analysis backend to forget cached results for `url`
    pub async fn clear_cache(&self, url: &str) -> EngineResult<String> {
        self.inner
            .analysis
            .clear_cache(url)
            .await
            .map_err(|e| EngineError::source_failed(SOURCE_AUDIO, e.to_string()))
    }

    pub async fn generation(&self) -> Uuid {
        self.inner.state.read().await.generation
    }

    /// Current merged marker list
    pub async fn markers(&self) -> Vec<Marker> {
        self.inner.state.read().await.markers.clone()
    }

    pub async fn source_failures(&self) -> Vec<SourceFailure> {
        self.inner.state.read().await.failures.clone()
    }

    pub async fn job(&self) -> Option<AnalysisJob> {
        self.inner.jobs.job().await
    }

    /// Job failure or timeout, for the status display
    pub async fn job_error(&self) -> Option<EngineError> {
        self.inner.jobs.error().await
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        let state = self.inner.state.read().await;
        EngineSnapshot {
            generation: state.generation,
            url: state.url.clone(),
            video_id: state.video_id.clone(),
            markers: state.markers.clone(),
            job: self.inner.jobs.job().await,
            failures: state.failures.clone(),
        }
    }
}

impl EngineInner {
    /// Replace one candidate slice and re-run the merge
    async fn store(&self, generation: Uuid, slice: Slice, candidates: Vec<HighlightCandidate>) {
        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(?slice, generation = %generation, "Dropping result for replaced video");
            return;
        }

        *state.slice_mut(slice) = candidates;
        state.markers = self.merger.merge_markers(&state.all_candidates());

        tracing::info!(
            ?slice,
            markers = state.markers.len(),
            "Highlight markers recomputed"
        );
        self.event_bus.emit_lossy(HighlightEvent::MarkersUpdated {
            generation,
            markers_count: state.markers.len(),
            timestamp: chrono::Utc::now(),
        });
    }

    async fn fail_source(&self, generation: Uuid, source_name: &str, message: String) {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return;
        }

        tracing::warn!(source = source_name, error = %message, "Highlight source failed");
        state.failures.push(SourceFailure {
            source_name: source_name.to_string(),
            message: message.clone(),
        });
        self.event_bus.emit_lossy(HighlightEvent::SourceFailed {
            generation,
            source_name: source_name.to_string(),
            message,
        });
    }
}

async fn run_comments(
    inner: Arc<EngineInner>,
    generation: Uuid,
    video_id: VideoId,
    cancel: CancellationToken,
) {
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = inner.comments.fetch_comments(&video_id) => result,
    };

    match result {
        Ok(comments) => {
            let candidates = inner.normalizer.normalize_comments(&comments);
            tracing::debug!(
                comments = comments.len(),
                candidates = candidates.len(),
                "Comment candidates normalized"
            );
            inner.store(generation, Slice::Comments, candidates).await;
        }
        Err(e) => inner.fail_source(generation, SOURCE_COMMENTS, e.to_string()).await,
    }
}

async fn run_heatmap(inner: Arc<EngineInner>, generation: Uuid, url: String, cancel: CancellationToken) {
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = inner.heatmap.fetch(&url) => result,
    };

    match result {
        Ok(heatmap) => {
            let candidates = inner.normalizer.normalize_heatmap(&heatmap);
            inner.store(generation, Slice::Heatmap, candidates).await;
        }
        Err(e) => inner.fail_source(generation, SOURCE_HEATMAP, e.to_string()).await,
    }
}

async fn run_analysis(
    inner: Arc<EngineInner>,
    generation: Uuid,
    action: JobAction,
    cancel: CancellationToken,
) {
    let Some(job) = inner.jobs.drive(action, cancel).await else {
        return;
    };

    match (job.state, job.result) {
        (JobState::Success, Some(highlights)) => {
            let candidates = inner.normalizer.normalize_audio(&highlights);
            inner.store(generation, Slice::Audio, candidates).await;
        }
        (state, _) => {
            tracing::warn!(
                job_id = %job.job_id,
                state = %state,
                message = ?job.last_message,
                "Analysis produced no audio highlights"
            );
        }
    }
}

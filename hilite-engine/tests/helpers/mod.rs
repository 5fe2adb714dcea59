//! Test helper utilities
//!
//! Shared mocks for hilite-engine integration tests

#![allow(dead_code)]

pub mod mock_services;
pub mod recording_surface;

pub use mock_services::{
    FailingCommentSource, ImmediateScheduler, MockAnalysis, MockHeatmap,
};
pub use recording_surface::RecordingSurface;

use hilite_common::config::EngineSettings;
use hilite_engine::highlight::CommentItem;
use hilite_engine::services::StaticCommentSource;
use hilite_engine::{EngineServices, HighlightEngine};
use std::sync::Arc;

/// Initialize test logging (safe to call from every test)
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hilite_engine=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Engine wired to mocks, polling without wall-clock delays
pub fn engine_with(
    settings: &EngineSettings,
    comments: Vec<CommentItem>,
    analysis: Arc<MockAnalysis>,
    heatmap: Arc<MockHeatmap>,
) -> HighlightEngine {
    let services = EngineServices::new(
        Arc::new(StaticCommentSource::new(comments)),
        analysis,
        heatmap,
    )
    .with_scheduler(Arc::new(ImmediateScheduler));
    HighlightEngine::new(settings, services)
}

//! Runtime coordination: analysis job polling, playback sync and the engine

pub mod engine;
pub mod job_controller;
pub mod job_runner;
pub mod sync_bridge;

pub use engine::{EngineServices, EngineSnapshot, HighlightEngine, SourceFailure};
pub use job_controller::{JobAction, JobController};
pub use job_runner::{JobRunner, Scheduler, TokioScheduler};
pub use sync_bridge::PlaybackSyncBridge;

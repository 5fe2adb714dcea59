//! hilite-engine library
//!
//! Highlight aggregation (comment, heatmap and audio sources merged into one
//! marker timeline), analysis job polling and playback synchronization.

pub mod error;
pub mod highlight;
pub mod models;
pub mod services;
pub mod video_id;
pub mod workflow;

pub use crate::error::{EngineError, EngineResult};
pub use crate::models::{HighlightCandidate, JobState, Marker, SourceType};
pub use crate::video_id::VideoId;
pub use crate::workflow::{EngineServices, HighlightEngine, PlaybackSyncBridge};

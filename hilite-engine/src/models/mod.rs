//! Data models

pub mod analysis_job;
pub mod candidate;
pub mod playback;

pub use analysis_job::{AnalysisJob, JobState, StateTransition};
pub use candidate::{HighlightCandidate, Marker, MarkerColor, SourceType};
pub use playback::PlaybackState;

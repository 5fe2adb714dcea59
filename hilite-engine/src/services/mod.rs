//! External collaborators
//!
//! Traits for the comment source, the audio analysis service, the heatmap
//! service and the playback surface, plus the HTTP client that speaks the
//! analysis backend's wire format.

pub mod analysis_client;
pub mod comment_source;
pub mod heatmap_client;
pub mod http_backend;
pub mod playback_surface;

pub use analysis_client::{AnalysisResponse, AnalysisService, AnalysisStatus};
pub use comment_source::{CommentSource, JsonCommentSource, StaticCommentSource};
pub use heatmap_client::{HeatmapHighlights, HeatmapPoint, HeatmapResponse, HeatmapService};
pub use http_backend::HttpBackendClient;
pub use playback_surface::{PlaybackSurface, SurfaceEvent};

use thiserror::Error;

/// Transport and payload errors from external services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Service answered but reported failure in its payload
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

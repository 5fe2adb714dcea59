//! Error types for hilite-engine
//!
//! No error is fatal to the process. Source failures are isolated to the
//! source that produced them; job failures and timeouts are surfaced to the
//! user without blocking comment or heatmap markers. Everything is
//! recoverable by submitting the URL again.

use thiserror::Error;

/// Engine error type
#[derive(Debug, Error)]
pub enum EngineError {
    /// A highlight source could not be fetched; it contributes no candidates
    #[error("Source '{source_name}' failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// Analysis backend reported failure
    #[error("Analysis failed: {0}")]
    Job(String),

    /// Status polling exhausted its attempt budget
    #[error("Analysis timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// URL does not match any recognised video URL shape
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    /// hilite-common error
    #[error("Common error: {0}")]
    Common(#[from] hilite_common::Error),
}

impl EngineError {
    pub fn source_failed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Source {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

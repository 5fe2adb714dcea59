//! Audio analysis service contract
//!
//! The backend downloads the video's audio and finds energy peaks. It is
//! long-running: `submit` either answers from cache (`success`) or starts
//! a background job (`processing`) that is then polled by key.

use super::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Status reported by submit and poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Success,
    Processing,
    Error,
    /// Backend has no record of the job (lost or expired)
    NotStarted,
}

/// Submit / poll response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: AnalysisStatus,
    /// Audio highlight times in seconds (present on success)
    #[serde(default, alias = "audio_highlights")]
    pub highlights: Option<Vec<f64>>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Key for status polls; absent when the job was already running
    #[serde(default)]
    pub cache_key: Option<String>,
    /// Backend processing stage (download_start, downloading, analysis_start...)
    #[serde(default)]
    pub stage: Option<String>,
}

impl AnalysisResponse {
    fn with_status(status: AnalysisStatus) -> Self {
        Self {
            status,
            highlights: None,
            message: None,
            error: None,
            cache_key: None,
            stage: None,
        }
    }

    pub fn success(highlights: Vec<f64>) -> Self {
        Self {
            highlights: Some(highlights),
            ..Self::with_status(AnalysisStatus::Success)
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_status(AnalysisStatus::Processing)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_status(AnalysisStatus::Error)
        }
    }

    pub fn not_started(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_status(AnalysisStatus::NotStarted)
        }
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Human-readable text: `message`, falling back to `error`
    pub fn display_message(&self) -> Option<String> {
        self.message.clone().or_else(|| self.error.clone())
    }
}

/// Audio analysis backend
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Start (or fetch cached) analysis for `url`
    async fn submit(&self, url: &str, force_fresh: bool) -> Result<AnalysisResponse, ServiceError>;

    /// Query status of a running analysis
    async fn poll(&self, job_key: &str) -> Result<AnalysisResponse, ServiceError>;

    /// Drop cached results for `url`; returns the backend's message
    async fn clear_cache(&self, url: &str) -> Result<String, ServiceError>;
}

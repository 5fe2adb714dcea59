//! HTTP client for the analysis backend
//!
//! Endpoints:
//! - `POST /api/process-youtube` `{youtube_url, force_fresh}`
//! - `GET /api/analysis-status?key=<job key>`
//! - `POST /api/clear-cache` `{youtube_url}`
//! - `GET /api/get-most-replayed?url=<video url>`

use super::analysis_client::{AnalysisResponse, AnalysisService};
use super::heatmap_client::{HeatmapHighlights, HeatmapResponse, HeatmapService};
use super::ServiceError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const USER_AGENT: &str = concat!("hilite/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ClearCacheResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Analysis + heatmap backend client
pub struct HttpBackendClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode an analysis response. Error statuses still carry a JSON body
    /// with `status: "error"`, so try that before reporting the HTTP code.
    async fn read_analysis(response: reqwest::Response) -> Result<AnalysisResponse, ServiceError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        match serde_json::from_str::<AnalysisResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ServiceError::Api(status.as_u16(), body)),
            Err(e) => Err(ServiceError::Parse(e.to_string())),
        }
    }
}

#[async_trait]
impl AnalysisService for HttpBackendClient {
    async fn submit(&self, url: &str, force_fresh: bool) -> Result<AnalysisResponse, ServiceError> {
        tracing::debug!(url = %url, force_fresh, "Submitting analysis request");

        let response = self
            .http_client
            .post(self.endpoint("/api/process-youtube"))
            .json(&json!({ "youtube_url": url, "force_fresh": force_fresh }))
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Self::read_analysis(response).await
    }

    async fn poll(&self, job_key: &str) -> Result<AnalysisResponse, ServiceError> {
        let response = self
            .http_client
            .get(self.endpoint("/api/analysis-status"))
            .query(&[("key", job_key)])
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(job_key = %job_key, "Backend has no record of job");
            return Ok(AnalysisResponse::not_started("Analysis not found"));
        }

        Self::read_analysis(response).await
    }

    async fn clear_cache(&self, url: &str) -> Result<String, ServiceError> {
        let response = self
            .http_client
            .post(self.endpoint("/api/clear-cache"))
            .json(&json!({ "youtube_url": url }))
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        let parsed: Option<ClearCacheResponse> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let message = parsed.and_then(|p| p.error).unwrap_or(body);
            return Err(ServiceError::Api(status.as_u16(), message));
        }

        Ok(parsed
            .and_then(|p| p.message)
            .unwrap_or_else(|| "Cache cleared".to_string()))
    }
}

#[async_trait]
impl HeatmapService for HttpBackendClient {
    async fn fetch(&self, url: &str) -> Result<HeatmapHighlights, ServiceError> {
        let response = self
            .http_client
            .get(self.endpoint("/api/get-most-replayed"))
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let parsed: HeatmapResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(ServiceError::Api(status.as_u16(), body));
            }
            Err(e) => return Err(ServiceError::Parse(e.to_string())),
        };

        let highlights = parsed.into_highlights()?;
        tracing::debug!(
            highest = highlights.highest_intensity.is_some(),
            labeled = highlights.labeled.is_some(),
            "Heatmap fetched"
        );
        Ok(highlights)
    }
}

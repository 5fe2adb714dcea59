//! "Most replayed" heatmap service contract
//!
//! The backend returns at most two interesting points: the heatmap segment
//! with the highest normalized intensity, and the point the video host
//! labels as most replayed. Millisecond values arrive as digit strings or
//! plain numbers; anything else drops that point.

use super::ServiceError;
use async_trait::async_trait;
use hilite_common::time_codec::millis_to_seconds;
use serde::Deserialize;
use serde_json::Value;

/// Heatmap response body
#[derive(Debug, Clone, Deserialize)]
pub struct HeatmapResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub most_replayed_label: Option<LabelInfo>,
    #[serde(default)]
    pub highest_intensity_marker_data: Option<IntensityMarker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelInfo {
    #[serde(default)]
    pub label_text: Option<String>,
    #[serde(default)]
    pub decoration_time_millis: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntensityMarker {
    #[serde(default)]
    pub start_millis: Option<Value>,
    #[serde(default)]
    pub duration_millis: Option<Value>,
    #[serde(default)]
    pub intensity_score_normalized: Option<Value>,
}

/// One heatmap point in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapPoint {
    pub time: f64,
    pub label: Option<String>,
    pub intensity: Option<f64>,
}

/// Parsed heatmap result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatmapHighlights {
    pub highest_intensity: Option<HeatmapPoint>,
    pub labeled: Option<HeatmapPoint>,
}

impl HeatmapHighlights {
    pub fn is_empty(&self) -> bool {
        self.highest_intensity.is_none() && self.labeled.is_none()
    }
}

impl HeatmapResponse {
    /// Convert to points, rejecting non-success payloads
    pub fn into_highlights(self) -> Result<HeatmapHighlights, ServiceError> {
        if self.status != "success" {
            return Err(ServiceError::Rejected(
                self.message
                    .unwrap_or_else(|| format!("heatmap status '{}'", self.status)),
            ));
        }

        let highest_intensity = self.highest_intensity_marker_data.and_then(|marker| {
            let time = marker.start_millis.as_ref().and_then(value_millis_to_seconds)?;
            Some(HeatmapPoint {
                time,
                label: None,
                intensity: marker
                    .intensity_score_normalized
                    .as_ref()
                    .and_then(value_to_f64),
            })
        });

        let labeled = self.most_replayed_label.and_then(|info| {
            let time = info
                .decoration_time_millis
                .as_ref()
                .and_then(value_millis_to_seconds)?;
            Some(HeatmapPoint {
                time,
                label: info.label_text,
                intensity: None,
            })
        });

        Ok(HeatmapHighlights {
            highest_intensity,
            labeled,
        })
    }
}

fn value_millis_to_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => millis_to_seconds(s),
        Value::Number(n) => n.as_u64().map(|ms| ms as f64 / 1000.0),
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Heatmap backend
#[async_trait]
pub trait HeatmapService: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<HeatmapHighlights, ServiceError>;
}

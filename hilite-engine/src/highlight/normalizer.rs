//! Source normalization
//!
//! Converts the raw output of each highlight source into
//! [`HighlightCandidate`] records the merger can compare.
//!
//! **Comments:** only comments with more likes than the configured
//! threshold count. Their timestamps are clustered; the leader of a
//! cluster mentioned more than once becomes a `PriorityComment`, leaders of
//! single-mention clusters become plain `Comment`s. Other members of a
//! frequent cluster are absorbed into its leader.
//!
//! **Audio:** flat list of seconds, taken as-is.
//!
//! **Heatmap:** at most two points, highest intensity and labeled.

use crate::highlight::clusterer::ProximityClusterer;
use crate::highlight::comment_extractor::{extract_from_comments, CommentItem};
use crate::models::{HighlightCandidate, SourceType};
use crate::services::heatmap_client::HeatmapHighlights;
use hilite_common::config::EngineSettings;
use tracing::debug;

/// Label used for the highest-intensity heatmap point when it has none
pub const HIGHEST_INTENSITY_LABEL: &str = "Highest intensity";

#[derive(Debug, Clone)]
pub struct SourceNormalizer {
    comment_clusterer: ProximityClusterer,
    min_comment_likes: u64,
}

impl SourceNormalizer {
    pub fn new(comment_window_secs: f64, min_comment_likes: u64) -> Self {
        Self {
            comment_clusterer: ProximityClusterer::new(comment_window_secs),
            min_comment_likes,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.comment_window_secs, settings.min_comment_likes)
    }

    /// Comment-derived candidates: priority leaders plus regular singletons
    pub fn normalize_comments(&self, comments: &[CommentItem]) -> Vec<HighlightCandidate> {
        let qualifying: Vec<_> = extract_from_comments(comments)
            .into_iter()
            .filter(|ts| ts.like_count > self.min_comment_likes)
            .collect();

        let times: Vec<f64> = qualifying.iter().map(|ts| ts.time).collect();
        let clusters = self.comment_clusterer.cluster(&times);

        let candidates: Vec<HighlightCandidate> = clusters
            .iter()
            .map(|cluster| {
                let likes: u64 = qualifying
                    .iter()
                    .filter(|ts| cluster.contains(ts.time))
                    .map(|ts| ts.like_count)
                    .sum();

                if cluster.is_frequent() {
                    HighlightCandidate::new(cluster.leader_time, SourceType::PriorityComment)
                        .with_weight(likes)
                        .with_label(format!("{} mentions", cluster.member_count))
                } else {
                    HighlightCandidate::new(cluster.leader_time, SourceType::Comment)
                        .with_weight(likes)
                }
            })
            .collect();

        debug!(
            comments = comments.len(),
            qualifying_timestamps = qualifying.len(),
            priority = candidates
                .iter()
                .filter(|c| c.source_type() == SourceType::PriorityComment)
                .count(),
            candidates = candidates.len(),
            "Normalized comment source"
        );

        candidates
    }

    /// Audio energy peaks, one candidate per value
    pub fn normalize_audio(&self, highlights: &[f64]) -> Vec<HighlightCandidate> {
        highlights
            .iter()
            .map(|&t| HighlightCandidate::new(t, SourceType::Audio))
            .collect()
    }

    /// Heatmap points: highest intensity first, then the labeled point
    pub fn normalize_heatmap(&self, heatmap: &HeatmapHighlights) -> Vec<HighlightCandidate> {
        let mut candidates = Vec::with_capacity(2);

        if let Some(point) = &heatmap.highest_intensity {
            let weight = point
                .intensity
                .filter(|i| i.is_finite() && *i > 0.0)
                .map(|i| (i * 100.0).round() as u64)
                .unwrap_or(0);
            candidates.push(
                HighlightCandidate::new(point.time, SourceType::MostReplayed)
                    .with_weight(weight)
                    .with_label(
                        point
                            .label
                            .clone()
                            .unwrap_or_else(|| HIGHEST_INTENSITY_LABEL.to_string()),
                    ),
            );
        }

        if let Some(point) = &heatmap.labeled {
            let candidate = HighlightCandidate::new(point.time, SourceType::MostReplayed);
            candidates.push(match &point.label {
                Some(label) => candidate.with_label(label.clone()),
                None => candidate,
            });
        }

        candidates
    }
}

impl Default for SourceNormalizer {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

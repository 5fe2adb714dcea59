//! Highlight candidates and final markers
//!
//! A [`HighlightCandidate`] is one unresolved timestamp from a single
//! source. A [`Marker`] is what survives cross-source merging and is
//! shown on the timeline.

use hilite_common::time_codec::seconds_to_timestamp;
use serde::Serialize;
use std::cmp::Ordering;

/// Origin of a highlight candidate
///
/// Declaration order is priority order: lower rank wins conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Leader of a timestamp mentioned by several comments
    PriorityComment,
    /// Heatmap "most replayed" point
    MostReplayed,
    /// Any other comment timestamp
    Comment,
    /// Audio energy peak
    Audio,
}

impl SourceType {
    /// Fixed priority rank (0 = highest priority)
    pub fn rank(&self) -> u8 {
        match self {
            SourceType::PriorityComment => 0,
            SourceType::MostReplayed => 1,
            SourceType::Comment => 2,
            SourceType::Audio => 3,
        }
    }

    pub fn color(&self) -> MarkerColor {
        match self {
            SourceType::PriorityComment => MarkerColor::Gold,
            SourceType::MostReplayed => MarkerColor::Red,
            SourceType::Comment => MarkerColor::Blue,
            SourceType::Audio => MarkerColor::Green,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::PriorityComment => "priority_comment",
            SourceType::MostReplayed => "most_replayed",
            SourceType::Comment => "comment",
            SourceType::Audio => "audio",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display color token for a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerColor {
    Gold,
    Red,
    Blue,
    Green,
}

impl MarkerColor {
    pub fn as_token(&self) -> &'static str {
        match self {
            MarkerColor::Gold => "gold",
            MarkerColor::Red => "red",
            MarkerColor::Blue => "blue",
            MarkerColor::Green => "green",
        }
    }
}

/// One single-source timestamp with metadata
///
/// Immutable once created. Times are clamped to `>= 0`; non-finite
/// times become `0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightCandidate {
    time: f64,
    source_type: SourceType,
    weight: u64,
    label: Option<String>,
}

impl HighlightCandidate {
    pub fn new(time: f64, source_type: SourceType) -> Self {
        Self {
            time: sanitize_time(time),
            source_type,
            weight: 0,
            label: None,
        }
    }

    /// Engagement weight (like count, mention likes, scaled intensity)
    pub fn with_weight(mut self, weight: u64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Timeline order: ascending time, ties by priority rank
    pub fn timeline_cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.source_type.rank().cmp(&other.source_type.rank()))
    }

    /// Conflict order: priority rank first, then earlier time
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        self.source_type
            .rank()
            .cmp(&other.source_type.rank())
            .then_with(|| self.time.total_cmp(&other.time))
    }
}

/// Final, displayed highlight point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub time: f64,
    pub source_type: SourceType,
    pub color: MarkerColor,
    pub label: Option<String>,
}

impl Marker {
    /// Timestamp text shown next to the marker
    pub fn timestamp(&self) -> String {
        seconds_to_timestamp(self.time)
    }
}

impl From<HighlightCandidate> for Marker {
    fn from(candidate: HighlightCandidate) -> Self {
        Self {
            time: candidate.time,
            source_type: candidate.source_type,
            color: candidate.source_type.color(),
            label: candidate.label,
        }
    }
}

impl From<&Marker> for HighlightCandidate {
    fn from(marker: &Marker) -> Self {
        let candidate = HighlightCandidate::new(marker.time, marker.source_type);
        match &marker.label {
            Some(label) => candidate.with_label(label.clone()),
            None => candidate,
        }
    }
}

fn sanitize_time(time: f64) -> f64 {
    if time.is_finite() && time > 0.0 {
        time
    } else {
        0.0
    }
}

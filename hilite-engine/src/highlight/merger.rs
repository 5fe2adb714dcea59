//! Priority merge of candidates from all sources
//!
//! Candidates closer together than the merge window are duplicates; the one
//! with the better source rank survives, and among equal ranks the earlier
//! one survives. Kept candidates are emitted in timeline order (ascending
//! time, ties by rank).
//!
//! Kept candidates are pairwise further apart than the window, so merging
//! an already-merged list returns it unchanged.

use crate::models::{HighlightCandidate, Marker};
use hilite_common::config::EngineSettings;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct PriorityMerger {
    window: f64,
}

impl PriorityMerger {
    /// Create merger; negative or non-finite windows are treated as `0`
    pub fn new(window_secs: f64) -> Self {
        let window = if window_secs.is_finite() && window_secs > 0.0 {
            window_secs
        } else {
            0.0
        };
        Self { window }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.merge_window_secs)
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    /// De-duplicate `candidates` across sources
    pub fn merge(&self, candidates: &[HighlightCandidate]) -> Vec<HighlightCandidate> {
        let mut by_priority: Vec<&HighlightCandidate> = candidates.iter().collect();
        by_priority.sort_by(|a, b| a.priority_cmp(b));

        let mut kept: Vec<HighlightCandidate> = Vec::with_capacity(by_priority.len());
        for candidate in by_priority {
            let conflicts = kept
                .iter()
                .any(|k| (k.time() - candidate.time()).abs() <= self.window);
            if !conflicts {
                kept.push(candidate.clone());
            }
        }

        kept.sort_by(|a, b| a.timeline_cmp(b));

        debug!(
            input = candidates.len(),
            kept = kept.len(),
            window = self.window,
            "Merged highlight candidates"
        );

        kept
    }

    /// Merge and convert to display markers
    pub fn merge_markers(&self, candidates: &[HighlightCandidate]) -> Vec<Marker> {
        self.merge(candidates).into_iter().map(Marker::from).collect()
    }
}

impl Default for PriorityMerger {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;

    fn c(time: f64, source_type: SourceType) -> HighlightCandidate {
        HighlightCandidate::new(time, source_type)
    }

    #[test]
    fn test_priority_comment_beats_audio() {
        let merged = PriorityMerger::new(1.0).merge(&[
            c(100.0, SourceType::Audio),
            c(100.5, SourceType::PriorityComment),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source_type(), SourceType::PriorityComment);
        assert_eq!(merged[0].time(), 100.5);
    }

    #[test]
    fn test_rank_order_across_all_sources() {
        let merged = PriorityMerger::new(1.0).merge(&[
            c(10.0, SourceType::Audio),
            c(10.2, SourceType::Comment),
            c(10.4, SourceType::MostReplayed),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source_type(), SourceType::MostReplayed);
    }

    #[test]
    fn test_distant_candidates_all_kept_in_time_order() {
        let merged = PriorityMerger::new(1.0).merge(&[
            c(50.0, SourceType::Audio),
            c(5.0, SourceType::Comment),
            c(20.0, SourceType::MostReplayed),
        ]);
        let times: Vec<f64> = merged.iter().map(|m| m.time()).collect();
        assert_eq!(times, vec![5.0, 20.0, 50.0]);
    }

    #[test]
    fn test_same_source_earlier_wins() {
        let merged =
            PriorityMerger::new(1.0).merge(&[c(31.0, SourceType::Audio), c(30.5, SourceType::Audio)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].time(), 30.5);
    }

    #[test]
    fn test_outside_window_both_kept() {
        let merged = PriorityMerger::new(1.0)
            .merge(&[c(10.0, SourceType::Audio), c(11.5, SourceType::PriorityComment)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source_type(), SourceType::Audio);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = vec![
            c(0.0, SourceType::Audio),
            c(0.9, SourceType::Comment),
            c(1.7, SourceType::PriorityComment),
            c(2.4, SourceType::Audio),
            c(3.0, SourceType::MostReplayed),
            c(3.0, SourceType::Audio),
            c(90.0, SourceType::PriorityComment),
            c(91.0, SourceType::Audio),
            c(400.25, SourceType::Comment),
        ];
        let merger = PriorityMerger::new(1.0);
        let once = merger.merge(&input);
        let twice = merger.merge(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(PriorityMerger::default().merge(&[]).is_empty());
    }

    #[test]
    fn test_markers_carry_source_color() {
        let markers = PriorityMerger::new(1.0).merge_markers(&[c(7.0, SourceType::Comment)]);
        assert_eq!(markers[0].color, SourceType::Comment.color());
    }
}

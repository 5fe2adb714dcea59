//! Playback state snapshot shared by the timeline and the player adapter

use serde::Serialize;

/// Snapshot of the playback bridge
///
/// `current_time` and `duration` are written only by the sampling loop;
/// `seek_target` only by marker activation and timeline drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current_time: f64,
    pub duration: f64,
    pub seek_target: Option<f64>,
}

impl PlaybackState {
    /// Duration is known once the surface reports a positive, finite value
    pub fn duration_known(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_known_requires_positive_finite() {
        let mut state = PlaybackState {
            current_time: 30.0,
            ..Default::default()
        };
        assert!(!state.duration_known());

        state.duration = f64::INFINITY;
        assert!(!state.duration_known());

        state.duration = 120.0;
        assert!(state.duration_known());
    }
}

//! Playback surface contract
//!
//! The embedded player is external. The engine only reads its position and
//! duration and asks it to seek; the player reports readiness and state
//! changes as [`SurfaceEvent`]s.

/// Embedded video player
pub trait PlaybackSurface: Send + Sync {
    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Duration in seconds, `0.0` while unknown
    fn duration(&self) -> f64;

    fn seek_to(&self, seconds: f64);
}

/// Player notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Ready,
    StateChanged,
    /// Player torn down; sampling must stop
    Destroyed,
}

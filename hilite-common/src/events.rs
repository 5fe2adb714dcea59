//! Event types for the Hilite event system
//!
//! Provides shared event definitions and the EventBus used by the engine
//! to notify status displays, timelines and the CLI.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Analysis job lifecycle state
///
/// `Idle → Requesting → {Success | Processing → … | Error}`;
/// `Processing → TimedOut` once the poll budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// No request issued yet
    Idle,
    /// Initial analysis request in flight
    Requesting,
    /// Backend accepted the job; polling
    Processing,
    /// Result available
    Success,
    /// Backend reported failure
    Error,
    /// Poll budget exhausted
    TimedOut,
}

impl JobState {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Error | JobState::TimedOut)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobState::Idle => "idle",
            JobState::Requesting => "requesting",
            JobState::Processing => "processing",
            JobState::Success => "success",
            JobState::Error => "error",
            JobState::TimedOut => "timed_out",
        };
        f.write_str(name)
    }
}

/// Hilite event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to a front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HighlightEvent {
    /// A new video URL replaced whatever was loaded before
    VideoSubmitted {
        /// Submission generation (changes on every submit)
        generation: Uuid,
        /// URL as entered
        url: String,
        /// Extracted video identifier
        video_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The merged marker list was recomputed
    MarkersUpdated {
        generation: Uuid,
        markers_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Analysis job moved between states
    JobStateChanged {
        job_id: Uuid,
        old_state: JobState,
        new_state: JobState,
        /// Latest message from the backend, if any
        message: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Analysis job still processing; progress text may have changed
    JobProgress {
        job_id: Uuid,
        attempt: u32,
        /// Poll budget; the job times out after this many checks
        max_attempts: u32,
        stage: Option<String>,
        message: Option<String>,
    },

    /// One highlight source failed; others are unaffected
    SourceFailed {
        generation: Uuid,
        source_name: String,
        message: String,
    },

    /// Sampled playback position
    PlaybackPosition { current_time: f64, duration: f64 },

    /// A new seek target was written
    SeekRequested { target: f64 },
}

/// Broadcast bus for [`HighlightEvent`]s
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HighlightEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use hilite_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<HighlightEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: HighlightEvent,
    ) -> Result<usize, broadcast::error::SendError<HighlightEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: HighlightEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

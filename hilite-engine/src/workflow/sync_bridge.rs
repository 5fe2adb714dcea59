//! Playback sync bridge
//!
//! Owns the shared seek target and the sampled playback position.
//!
//! Writers:
//! - seek target: [`PlaybackSyncBridge::request_seek`] (marker activation and
//!   timeline drag go through it)
//! - position and duration: the sampling loop started by `attach`
//!
//! Readers subscribe through [`PlaybackSyncBridge::subscribe`]. While a
//! surface is attached, every seek target write is forwarded to
//! `PlaybackSurface::seek_to`; that is the only path by which the bridge
//! moves the player. Targets written faster than the forwarder runs
//! coalesce to the latest one.

use crate::models::{Marker, PlaybackState};
use crate::services::{PlaybackSurface, SurfaceEvent};
use hilite_common::config::EngineSettings;
use hilite_common::events::{EventBus, HighlightEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

struct Attachment {
    surface: Arc<dyn PlaybackSurface>,
    cancel: CancellationToken,
}

struct BridgeInner {
    sample_interval: Duration,
    state_tx: watch::Sender<PlaybackState>,
    seek_tx: watch::Sender<Option<f64>>,
    attachment: Mutex<Option<Attachment>>,
    event_bus: EventBus,
}

/// Shared seek/position cell between the timeline and the player
#[derive(Clone)]
pub struct PlaybackSyncBridge {
    inner: Arc<BridgeInner>,
}

impl PlaybackSyncBridge {
    pub fn new(sample_interval: Duration, event_bus: EventBus) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::default());
        let (seek_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(BridgeInner {
                sample_interval,
                state_tx,
                seek_tx,
                attachment: Mutex::new(None),
                event_bus,
            }),
        }
    }

    pub fn from_settings(settings: &EngineSettings, event_bus: EventBus) -> Self {
        Self::new(settings.sample_interval(), event_bus)
    }

    /// Current snapshot
    pub fn state(&self) -> PlaybackState {
        *self.inner.state_tx.borrow()
    }

    /// Receiver notified on every position sample and seek
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.inner.state_tx.subscribe()
    }

    /// Write the seek target
    ///
    /// Returns the clamped target, or `None` when duration is unknown or the
    /// value is not finite (nothing is written in that case).
    pub fn request_seek(&self, seconds: f64) -> Option<f64> {
        let state = self.state();
        if !state.duration_known() {
            tracing::debug!(target_s = seconds, "Seek ignored, duration unknown");
            return None;
        }
        if !seconds.is_finite() {
            return None;
        }

        let target = seconds.clamp(0.0, state.duration);
        self.inner
            .state_tx
            .send_modify(|s| s.seek_target = Some(target));
        self.inner.seek_tx.send_replace(Some(target));
        self.inner
            .event_bus
            .emit_lossy(HighlightEvent::SeekRequested { target });
        Some(target)
    }

    /// Seek to a marker's time
    pub fn activate_marker(&self, marker: &Marker) -> Option<f64> {
        self.request_seek(marker.time)
    }

    /// Seek from a pointer position over the timeline widget
    ///
    /// The fraction `(pointer_x - box_left) / box_width` is clamped to
    /// `[0, 1]` and scaled by duration.
    pub fn drag(&self, pointer_x: f64, box_left: f64, box_width: f64) -> Option<f64> {
        if !(box_width.is_finite() && box_width > 0.0) {
            return None;
        }
        let fraction = ((pointer_x - box_left) / box_width).clamp(0.0, 1.0);
        if !fraction.is_finite() {
            return None;
        }
        self.request_seek(fraction * self.state().duration)
    }

    /// Bind a playback surface, replacing any previous one
    ///
    /// Samples once immediately, then every sample interval until the
    /// surface is detached or replaced.
    pub async fn attach(&self, surface: Arc<dyn PlaybackSurface>) {
        let mut attachment = self.inner.attachment.lock().await;
        if let Some(previous) = attachment.take() {
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        self.inner.sample(surface.as_ref(), &cancel);

        // subscribing here marks earlier targets as seen
        let seek_rx = self.inner.seek_tx.subscribe();
        tokio::spawn(sample_loop(
            Arc::clone(&self.inner),
            Arc::clone(&surface),
            cancel.clone(),
        ));
        tokio::spawn(forward_seeks(
            seek_rx,
            Arc::clone(&surface),
            cancel.clone(),
        ));

        tracing::debug!(
            interval_ms = self.inner.sample_interval.as_millis() as u64,
            "Playback surface attached"
        );
        *attachment = Some(Attachment { surface, cancel });
    }

    /// Stop sampling and seek forwarding
    ///
    /// Position and duration drop back to unknown, so seeks are refused
    /// until another surface is attached and sampled.
    pub async fn detach(&self) {
        if let Some(previous) = self.inner.attachment.lock().await.take() {
            previous.cancel.cancel();
            self.inner.state_tx.send_modify(|s| {
                s.current_time = 0.0;
                s.duration = 0.0;
            });
            tracing::debug!("Playback surface detached");
        }
    }

    pub async fn is_attached(&self) -> bool {
        self.inner.attachment.lock().await.is_some()
    }

    /// React to a player notification
    pub async fn handle_surface_event(&self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Ready | SurfaceEvent::StateChanged => {
                if let Some(attachment) = self.inner.attachment.lock().await.as_ref() {
                    self.inner.sample(attachment.surface.as_ref(), &attachment.cancel);
                }
            }
            SurfaceEvent::Destroyed => self.detach().await,
        }
    }

    /// Detach and forget position, duration and seek target
    pub async fn reset(&self) {
        self.detach().await;
        self.inner.seek_tx.send_replace(None);
        self.inner.state_tx.send_replace(PlaybackState::default());
    }
}

impl BridgeInner {
    /// Record one position sample unless `cancel` has fired
    fn sample(&self, surface: &dyn PlaybackSurface, cancel: &CancellationToken) {
        let current_time = non_negative(surface.current_time());
        let duration = non_negative(surface.duration());

        // checked under the watch lock so a detached surface cannot overwrite the reset
        let written = self.state_tx.send_if_modified(|s| {
            if cancel.is_cancelled() {
                return false;
            }
            s.current_time = current_time;
            s.duration = duration;
            true
        });
        if !written {
            return;
        }
        self.event_bus.emit_lossy(HighlightEvent::PlaybackPosition {
            current_time,
            duration,
        });
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

async fn sample_loop(
    inner: Arc<BridgeInner>,
    surface: Arc<dyn PlaybackSurface>,
    cancel: CancellationToken,
) {
    let mut timer = interval(inner.sample_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = timer.tick() => inner.sample(surface.as_ref(), &cancel),
        }
    }
}

async fn forward_seeks(
    mut seek_rx: watch::Receiver<Option<f64>>,
    surface: Arc<dyn PlaybackSurface>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = seek_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let target = *seek_rx.borrow_and_update();
                if let Some(target) = target {
                    surface.seek_to(target);
                }
            }
        }
    }
}

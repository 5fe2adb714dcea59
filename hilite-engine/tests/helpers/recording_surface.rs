//! Playback surface that records seeks

use hilite_engine::services::PlaybackSurface;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct RecordingSurface {
    current_time: Mutex<f64>,
    duration: Mutex<f64>,
    seeks: Mutex<Vec<f64>>,
}

impl RecordingSurface {
    pub fn new(duration: f64) -> Arc<Self> {
        Arc::new(Self {
            current_time: Mutex::new(0.0),
            duration: Mutex::new(duration),
            seeks: Mutex::new(Vec::new()),
        })
    }

    pub fn set_duration(&self, duration: f64) {
        *self.duration.lock().unwrap() = duration;
    }

    pub fn set_current_time(&self, seconds: f64) {
        *self.current_time.lock().unwrap() = seconds;
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }

    /// Wait (bounded) until a seek to `target` has been forwarded
    pub async fn wait_for_seek(&self, target: f64) -> bool {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !self.seeks().contains(&target) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }
}

impl PlaybackSurface for RecordingSurface {
    fn current_time(&self) -> f64 {
        *self.current_time.lock().unwrap()
    }

    fn duration(&self) -> f64 {
        *self.duration.lock().unwrap()
    }

    fn seek_to(&self, seconds: f64) {
        self.seeks.lock().unwrap().push(seconds);
        *self.current_time.lock().unwrap() = seconds;
    }
}

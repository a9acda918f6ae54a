//! Statistics for the sampling and broadcast loops

use std::time::{Duration, Instant};

/// Sampler loop statistics
#[derive(Debug, Clone)]
pub struct SamplerStats {
    /// When the loop started
    pub started_at: Instant,
    /// Iterations run
    pub iterations: u64,
    /// Iterations whose capture or inference failed
    pub failed_frames: u64,
    /// Detections published to the mailbox
    pub detections: u64,
    /// Published detections that replaced an unconsumed one
    pub overwritten: u64,
    /// Iterations that took longer than the frame interval
    pub overruns: u64,
}

impl SamplerStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            iterations: 0,
            failed_frames: 0,
            detections: 0,
            overwritten: 0,
            overruns: 0,
        }
    }

    /// Time since the loop started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Achieved iterations per second
    pub fn effective_fps(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.iterations as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for SamplerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Broadcaster loop statistics
#[derive(Debug, Clone, Default)]
pub struct BroadcastStats {
    /// Ticks run
    pub ticks: u64,
    /// Alert events emitted
    pub alerts: u64,
    /// Heartbeat events emitted
    pub heartbeats: u64,
    /// Deliveries that succeeded, summed over ticks
    pub delivered: u64,
    /// Subscribers removed after a failed send
    pub dropped_subscribers: u64,
    /// Ticks where the game state was unavailable
    pub poll_unavailable: u64,
}

impl BroadcastStats {
    pub fn new() -> Self {
        Self::default()
    }
}

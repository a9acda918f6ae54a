//! Sampler configuration

use std::time::Duration;

use super::classifier::ClassifierMode;
use super::region::CaptureRegion;
use crate::error::{Error, Result};

/// Sampler loop options
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Screen region to sample
    pub region: CaptureRegion,

    /// Target iterations per second
    pub fps: u32,

    /// Minimum confidence for a candidate to count
    pub confidence_threshold: f32,

    /// Classification path
    pub mode: ClassifierMode,
}

impl SamplerConfig {
    /// Defaults for the given region: 10 fps, threshold 0.6, substitute mode
    pub fn new(region: CaptureRegion) -> Self {
        Self {
            region,
            fps: 10,
            confidence_threshold: 0.6,
            mode: ClassifierMode::Substitute,
        }
    }

    /// Set the target rate
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the confidence threshold
    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the classification mode
    pub fn mode(mut self, mode: ClassifierMode) -> Self {
        self.mode = mode;
        self
    }

    /// Time budget for one iteration
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    /// Reject settings the sampler cannot run with
    pub fn validate(&self) -> Result<()> {
        self.region.validate()?;
        if self.fps == 0 {
            return Err(Error::Config("fps must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::Config(format!(
                "confidence threshold {} outside [0, 1]",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

//! Sampling loop
//!
//! Runs on a dedicated thread: capture a frame, classify it, keep the best
//! candidate above the confidence threshold and publish it to the mailbox.
//! The loop is paced to the configured rate. A slow iteration is followed
//! immediately by the next one, never by a burst of catch-up iterations.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use chrono::Local;

use super::classifier::Classifier;
use super::config::SamplerConfig;
use super::detection::{Candidate, Detection};
use super::frame::FrameSource;
use super::zone::ZoneTable;
use crate::error::{Error, Result};
use crate::mailbox::Mailbox;
use crate::shutdown::StopSignal;
use crate::stats::SamplerStats;

/// Pick the highest-confidence candidate at or above `threshold`
///
/// Ties go to the candidate seen first.
pub fn select_best(candidates: Vec<Candidate>, threshold: f32) -> Option<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.confidence >= threshold)
        .fold(None, |best: Option<Candidate>, c| match best {
            Some(b) if b.confidence >= c.confidence => Some(b),
            _ => Some(c),
        })
}

/// Frame sampler
pub struct Sampler {
    config: SamplerConfig,
    source: Box<dyn FrameSource>,
    classifier: Classifier,
    zones: Arc<ZoneTable>,
    mailbox: Arc<Mailbox>,
    stats: SamplerStats,
    failure_streak: u64,
}

impl Sampler {
    /// Create a sampler
    ///
    /// Fails if the configuration is invalid or names a different
    /// classification mode than the classifier provided.
    pub fn new(
        config: SamplerConfig,
        source: Box<dyn FrameSource>,
        classifier: Classifier,
        zones: Arc<ZoneTable>,
        mailbox: Arc<Mailbox>,
    ) -> Result<Self> {
        config.validate()?;
        if config.mode != classifier.mode() {
            return Err(Error::Config(format!(
                "sampler configured for {} classification but given a {} classifier",
                config.mode,
                classifier.mode()
            )));
        }

        Ok(Self {
            config,
            source,
            classifier,
            zones,
            mailbox,
            stats: SamplerStats::new(),
            failure_streak: 0,
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn stats(&self) -> &SamplerStats {
        &self.stats
    }

    /// Run one capture-classify-publish step
    ///
    /// Returns the published detection, if any.
    pub fn sample_once(&mut self) -> Result<Option<Detection>> {
        let region = self.config.region;
        let captured_at = Local::now();

        let frame = self.source.capture(&region)?;
        if !frame.matches(&region) {
            return Err(Error::Capture(format!(
                "frame is {}x{}, expected {}x{}",
                frame.width, frame.height, region.width, region.height
            )));
        }

        let candidates = self.classifier.infer(&frame)?;
        let Some(best) = select_best(candidates, self.config.confidence_threshold) else {
            return Ok(None);
        };

        let zone = self.zones.classify(&best.bbox, frame.width, frame.height);
        let detection = Detection::from_candidate(best, zone, captured_at);

        self.stats.detections += 1;
        if self.mailbox.publish(detection.clone()) {
            self.stats.overwritten += 1;
            tracing::debug!("Unconsumed detection overwritten");
        }

        Ok(Some(detection))
    }

    /// Run until `stop` is observed
    ///
    /// Stop is checked between iterations, so it takes effect within one
    /// frame interval.
    pub fn run(mut self, stop: StopSignal) -> SamplerStats {
        let interval = self.config.frame_interval();
        self.stats.started_at = Instant::now();

        tracing::info!(
            fps = self.config.fps,
            mode = %self.classifier.mode(),
            region = %self.config.region,
            threshold = self.config.confidence_threshold,
            "Sampler started"
        );

        while !stop.is_stopped() {
            let started = Instant::now();
            self.stats.iterations += 1;

            match self.sample_once() {
                Ok(Some(detection)) => {
                    self.failure_streak = 0;
                    tracing::debug!(
                        label = %detection.label,
                        zone = %detection.zone,
                        confidence = detection.confidence,
                        "Detection published"
                    );
                }
                Ok(None) => self.failure_streak = 0,
                Err(e) => {
                    self.stats.failed_frames += 1;
                    self.failure_streak += 1;
                    if self.failure_streak == 1 {
                        tracing::warn!(error = %e, "Sampling iteration failed");
                    } else {
                        tracing::debug!(error = %e, streak = self.failure_streak, "Sampling iteration failed");
                    }
                }
            }

            match interval.checked_sub(started.elapsed()) {
                Some(remaining) => thread::sleep(remaining),
                None => self.stats.overruns += 1,
            }
        }

        tracing::info!(
            iterations = self.stats.iterations,
            detections = self.stats.detections,
            overwritten = self.stats.overwritten,
            failed = self.stats.failed_frames,
            overruns = self.stats.overruns,
            effective_fps = self.stats.effective_fps(),
            "Sampler stopped"
        );

        self.stats
    }

    /// Run on a new named thread
    pub fn spawn(self, stop: StopSignal) -> Result<JoinHandle<SamplerStats>> {
        let handle = thread::Builder::new()
            .name("sampler".into())
            .spawn(move || self.run(stop))?;
        Ok(handle)
    }
}

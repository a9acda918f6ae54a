//! Classification strategies
//!
//! The sampler talks to a [`Classifier`], which is either a real model
//! behind the [`Model`] trait or a seedable [`SubstituteModel`] that emits
//! occasional fake sightings. The variant is chosen once when the sampler is
//! built and cannot change afterwards.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::detection::{BoundingBox, Candidate};
use super::frame::Frame;
use super::labels::LabelTable;
use super::zone::ZoneTable;
use crate::error::{Error, Result};

/// Half the side of a substitute sighting's box, in pixels
const SUBSTITUTE_HALF_SIZE: f64 = 15.0;

/// An object classification model
///
/// Returns every object found in the frame; thresholding and selection are
/// the caller's job.
pub trait Model: Send {
    fn infer(&mut self, frame: &Frame) -> Result<Vec<Candidate>>;
}

/// Which classification path to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierMode {
    /// Pseudo-random sightings, for hosts without a usable model
    #[default]
    Substitute,
    /// A real model
    Model,
}

impl fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierMode::Substitute => write!(f, "substitute"),
            ClassifierMode::Model => write!(f, "model"),
        }
    }
}

impl FromStr for ClassifierMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "substitute" | "mock" => Ok(ClassifierMode::Substitute),
            "model" => Ok(ClassifierMode::Model),
            other => Err(Error::Config(format!("unknown classifier mode: {}", other))),
        }
    }
}

/// Classification path selected at startup
pub enum Classifier {
    Model(Box<dyn Model>),
    Substitute(SubstituteModel),
}

impl Classifier {
    pub fn mode(&self) -> ClassifierMode {
        match self {
            Classifier::Model(_) => ClassifierMode::Model,
            Classifier::Substitute(_) => ClassifierMode::Substitute,
        }
    }

    pub fn infer(&mut self, frame: &Frame) -> Result<Vec<Candidate>> {
        match self {
            Classifier::Model(model) => model.infer(frame),
            Classifier::Substitute(model) => Ok(model.infer(frame)),
        }
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Classifier").field(&self.mode()).finish()
    }
}

/// Substitute model settings
#[derive(Debug, Clone)]
pub struct SubstituteConfig {
    /// Chance of a sighting per call
    pub probability: f64,

    /// Range confidences are drawn from
    pub confidence_range: RangeInclusive<f32>,

    /// Fixed RNG seed (None = seed from the OS)
    pub seed: Option<u64>,
}

impl Default for SubstituteConfig {
    fn default() -> Self {
        Self {
            // ~1 sighting every 5 s at 10 fps
            probability: 0.02,
            confidence_range: 0.75..=0.98,
            seed: None,
        }
    }
}

impl SubstituteConfig {
    /// Set the per-call sighting probability
    pub fn probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    /// Set the RNG seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check probability and confidence bounds
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(Error::Config(format!(
                "substitute probability {} outside [0, 1]",
                self.probability
            )));
        }
        let (lo, hi) = (*self.confidence_range.start(), *self.confidence_range.end());
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
            return Err(Error::Config(format!(
                "substitute confidence range {}..={} invalid",
                lo, hi
            )));
        }
        Ok(())
    }
}

/// Deterministic stand-in for a real model
///
/// With the configured probability, reports one object with a random
/// label, placed at a random point inside a random zone.
pub struct SubstituteModel {
    config: SubstituteConfig,
    labels: Vec<String>,
    zones: Arc<ZoneTable>,
    rng: StdRng,
}

impl SubstituteModel {
    /// Create a substitute model
    pub fn new(config: SubstituteConfig, labels: LabelTable, zones: Arc<ZoneTable>) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            config,
            labels: labels.names().map(str::to_string).collect(),
            zones,
            rng,
        })
    }

    pub fn infer(&mut self, frame: &Frame) -> Vec<Candidate> {
        if self.labels.is_empty() || !self.rng.random_bool(self.config.probability) {
            return Vec::new();
        }

        let label = self.labels[self.rng.random_range(0..self.labels.len())].clone();
        let confidence = self.rng.random_range(self.config.confidence_range.clone());
        let confidence = (confidence * 100.0).round() / 100.0;
        let bbox = self.random_bbox(frame.width, frame.height);

        vec![Candidate::new(label, confidence, bbox)]
    }

    fn random_bbox(&mut self, width: u32, height: u32) -> BoundingBox {
        let (nx, ny) = match self.zones.zones() {
            [] => (0.5, 0.5),
            zones => {
                let rect = zones[self.rng.random_range(0..zones.len())].rect;
                (
                    self.rng.random_range(rect.x1..=rect.x2),
                    self.rng.random_range(rect.y1..=rect.y2),
                )
            }
        };

        let (w, h) = (width as f64, height as f64);
        let (cx, cy) = (nx * w, ny * h);
        BoundingBox::new(
            (cx - SUBSTITUTE_HALF_SIZE).max(0.0) as i32,
            (cy - SUBSTITUTE_HALF_SIZE).max(0.0) as i32,
            (cx + SUBSTITUTE_HALF_SIZE).min(w) as i32,
            (cy + SUBSTITUTE_HALF_SIZE).min(h) as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn frame() -> Frame {
        Frame::new(278, 278, Bytes::new())
    }

    fn substitute(config: SubstituteConfig) -> SubstituteModel {
        SubstituteModel::new(
            config,
            LabelTable::default(),
            Arc::new(ZoneTable::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_always_fires_at_probability_one() {
        let mut model = substitute(SubstituteConfig::default().probability(1.0).seed(7));
        let labels = LabelTable::default();
        let known: Vec<&str> = labels.names().collect();

        for _ in 0..200 {
            let candidates = model.infer(&frame());
            assert_eq!(candidates.len(), 1);

            let c = &candidates[0];
            assert!(known.contains(&c.label.as_str()));
            assert!((0.75..=0.98).contains(&c.confidence), "{}", c.confidence);
            assert!(c.bbox.x1 <= c.bbox.x2 && c.bbox.y1 <= c.bbox.y2);
            assert!(c.bbox.x1 >= 0 && c.bbox.x2 <= 278);
            assert!(c.bbox.y1 >= 0 && c.bbox.y2 <= 278);
        }
    }

    #[test]
    fn test_never_fires_at_probability_zero() {
        let mut model = substitute(SubstituteConfig::default().probability(0.0).seed(7));

        for _ in 0..200 {
            assert!(model.infer(&frame()).is_empty());
        }
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let config = SubstituteConfig::default().probability(0.5).seed(1234);
        let mut a = substitute(config.clone());
        let mut b = substitute(config);

        for _ in 0..100 {
            assert_eq!(a.infer(&frame()), b.infer(&frame()));
        }
    }

    #[test]
    fn test_confidence_rounded_to_hundredths() {
        let mut model = substitute(SubstituteConfig::default().probability(1.0).seed(99));

        for _ in 0..50 {
            let c = model.infer(&frame()).remove(0).confidence;
            let scaled = c * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-3, "{}", c);
        }
    }

    #[test]
    fn test_validate() {
        assert!(SubstituteConfig::default().validate().is_ok());
        assert!(SubstituteConfig::default().probability(1.5).validate().is_err());
        assert!(SubstituteConfig::default().probability(f64::NAN).validate().is_err());

        let mut config = SubstituteConfig::default();
        config.confidence_range = 0.9..=0.5;
        assert!(config.validate().is_err());

        let rejected = SubstituteModel::new(
            SubstituteConfig::default().probability(-0.1),
            LabelTable::default(),
            Arc::new(ZoneTable::default()),
        );
        assert!(matches!(rejected, Err(Error::Config(_))));
    }

    #[test]
    fn test_classifier_dispatch() {
        struct Fixed;
        impl Model for Fixed {
            fn infer(&mut self, _frame: &Frame) -> Result<Vec<Candidate>> {
                Ok(vec![Candidate::new("Vi", 0.8, BoundingBox::new(0, 0, 1, 1))])
            }
        }

        let mut classifier = Classifier::Model(Box::new(Fixed));
        assert_eq!(classifier.mode(), ClassifierMode::Model);
        assert_eq!(classifier.infer(&frame()).unwrap().len(), 1);

        let classifier = Classifier::Substitute(substitute(SubstituteConfig::default()));
        assert_eq!(classifier.mode(), ClassifierMode::Substitute);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            "substitute".parse::<ClassifierMode>().unwrap(),
            ClassifierMode::Substitute
        );
        assert_eq!("MOCK".parse::<ClassifierMode>().unwrap(), ClassifierMode::Substitute);
        assert_eq!("model".parse::<ClassifierMode>().unwrap(), ClassifierMode::Model);
        assert!("yolo".parse::<ClassifierMode>().is_err());
        assert_eq!(ClassifierMode::Model.to_string(), "model");
    }
}

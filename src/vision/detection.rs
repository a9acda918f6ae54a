//! Detection types
//!
//! A [`Candidate`] is what a model reports for one object; a [`Detection`] is
//! the selected candidate with its zone resolved and capture time attached.

use chrono::{DateTime, Local};

/// Axis-aligned box in frame pixel coordinates
///
/// Corners are ordered: `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Create a bounding box from ordered corners
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        debug_assert!(x1 <= x2 && y1 <= y2, "bounding box corners out of order");
        Self { x1, y1, x2, y2 }
    }

    /// Center point in pixels
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 as f64 + self.x2 as f64) / 2.0,
            (self.y1 as f64 + self.y2 as f64) / 2.0,
        )
    }

    /// Width in pixels
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    /// Height in pixels
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

/// One raw result from a classification model
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Candidate {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// A sighting handed from the sampler to the broadcaster
///
/// Immutable once built. Consumed at most once through the mailbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Class label
    pub label: String,
    /// Model confidence in `[0, 1]`
    pub confidence: f32,
    /// Zone name resolved from the box center
    pub zone: String,
    /// Box in frame pixels
    pub bbox: BoundingBox,
    /// When the frame was captured
    pub captured_at: DateTime<Local>,
}

impl Detection {
    /// Build a detection from a selected candidate
    pub fn from_candidate(
        candidate: Candidate,
        zone: impl Into<String>,
        captured_at: DateTime<Local>,
    ) -> Self {
        Self {
            label: candidate.label,
            confidence: candidate.confidence,
            zone: zone.into(),
            bbox: candidate.bbox,
            captured_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_geometry() {
        let bbox = BoundingBox::new(100, 50, 130, 80);

        assert_eq!(bbox.center(), (115.0, 65.0));
        assert_eq!(bbox.width(), 30);
        assert_eq!(bbox.height(), 30);
    }

    #[test]
    fn test_degenerate_bbox() {
        let bbox = BoundingBox::new(10, 10, 10, 10);
        assert_eq!(bbox.center(), (10.0, 10.0));
        assert_eq!(bbox.width(), 0);
    }

    #[test]
    fn test_detection_from_candidate() {
        let now = Local::now();
        let candidate = Candidate::new("Vi", 0.9, BoundingBox::new(0, 0, 4, 4));
        let detection = Detection::from_candidate(candidate, "BARON PIT", now);

        assert_eq!(detection.label, "Vi");
        assert_eq!(detection.zone, "BARON PIT");
        assert_eq!(detection.confidence, 0.9);
        assert_eq!(detection.captured_at, now);
    }
}

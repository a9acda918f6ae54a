//! Capture region derivation
//!
//! The minimap sits in the bottom-right corner of the display at fixed
//! proportions of the display size:
//!
//! - left edge at 85% of the display width
//! - top edge at 73% of the display height
//! - square, with a side of 14.5% of the display width
//!
//! Ratios are applied in integer per-mille arithmetic so results are exact
//! floors (1920 × 0.85 is 1632, not 1631).

use std::fmt;

use crate::error::{Error, Result};

/// Left edge, in thousandths of display width
const LEFT_PERMILLE: u64 = 850;
/// Top edge, in thousandths of display height
const TOP_PERMILLE: u64 = 730;
/// Side length, in thousandths of display width
const SIZE_PERMILLE: u64 = 145;

/// Screen rectangle to sample, in absolute pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    /// Create an explicit region
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Result<Self> {
        let region = Self {
            left,
            top,
            width,
            height,
        };
        region.validate()?;
        Ok(region)
    }

    /// Derive the minimap region from the display resolution
    pub fn from_display(display_width: u32, display_height: u32) -> Result<Self> {
        if display_width == 0 || display_height == 0 {
            return Err(Error::InvalidRegion(format!(
                "display {}x{} has a zero dimension",
                display_width, display_height
            )));
        }

        let size = scale(display_width, SIZE_PERMILLE);
        Self::new(
            scale(display_width, LEFT_PERMILLE),
            scale(display_height, TOP_PERMILLE),
            size,
            size,
        )
    }

    /// Check that the region covers at least one pixel
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidRegion(format!("{} is empty", self)));
        }
        Ok(())
    }

    /// Number of pixels covered
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.left, self.top, self.width, self.height
        )
    }
}

fn scale(value: u32, permille: u64) -> u32 {
    // value <= u32::MAX and permille < 1000, so the result fits in u32
    (value as u64 * permille / 1000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_display_1080p() {
        let region = CaptureRegion::from_display(1920, 1080).unwrap();

        assert_eq!(
            region,
            CaptureRegion {
                left: 1632,
                top: 788,
                width: 278,
                height: 278,
            }
        );
    }

    #[test]
    fn test_from_display_1440p() {
        let region = CaptureRegion::from_display(2560, 1440).unwrap();

        assert_eq!(region.left, 2176);
        assert_eq!(region.top, 1051);
        assert_eq!(region.width, 371);
        assert_eq!(region.height, 371);
    }

    #[test]
    fn test_from_display_zero_dimension() {
        assert!(matches!(
            CaptureRegion::from_display(0, 1080),
            Err(Error::InvalidRegion(_))
        ));
        assert!(matches!(
            CaptureRegion::from_display(1920, 0),
            Err(Error::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_tiny_display_yields_empty_region() {
        // 6 * 0.145 floors to 0
        assert!(CaptureRegion::from_display(6, 6).is_err());
    }

    #[test]
    fn test_new_validates() {
        assert!(CaptureRegion::new(0, 0, 10, 10).is_ok());
        assert!(CaptureRegion::new(0, 0, 0, 10).is_err());
    }

    #[test]
    fn test_display_format() {
        let region = CaptureRegion::new(1632, 788, 278, 278).unwrap();
        assert_eq!(region.to_string(), "(1632, 788) 278x278");
        assert_eq!(region.area(), 278 * 278);
    }
}

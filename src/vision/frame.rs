//! Frame acquisition
//!
//! Capturing pixels is delegated to a [`FrameSource`]. The sampler only
//! relies on the returned frame matching the requested region size.

use bytes::Bytes;

use super::region::CaptureRegion;
use crate::error::Result;

/// Bytes per pixel for BGRA frames
pub const BYTES_PER_PIXEL: usize = 4;

/// A captured BGRA pixel buffer
///
/// Cheap to clone: the pixel data is reference counted.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Bytes) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Whether the frame covers exactly the given region
    pub fn matches(&self, region: &CaptureRegion) -> bool {
        self.width == region.width && self.height == region.height
    }
}

/// Something that can grab the pixels of a screen region
pub trait FrameSource: Send {
    fn capture(&mut self, region: &CaptureRegion) -> Result<Frame>;
}

/// Frame source producing a uniformly filled frame
///
/// Stands in for a screen grabber on hosts without one.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    fill: [u8; BYTES_PER_PIXEL],
}

impl SyntheticSource {
    /// Opaque black frames
    pub fn new() -> Self {
        Self::with_fill([0, 0, 0, 0xff])
    }

    /// Frames filled with one BGRA pixel value
    pub fn with_fill(fill: [u8; BYTES_PER_PIXEL]) -> Self {
        Self { fill }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for SyntheticSource {
    fn capture(&mut self, region: &CaptureRegion) -> Result<Frame> {
        let data = self.fill.repeat(region.area());
        Ok(Frame::new(region.width, region.height, Bytes::from(data)))
    }
}

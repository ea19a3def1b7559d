//! Frame geometry helpers shared by the reader and the encoders

use image::RgbaImage;
use vidweb_core::EncodeError;

/// Requested output dimensions.
///
/// Both set resizes exactly; one set scales the other side to keep the aspect
/// ratio; neither keeps the source size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl FrameSize {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    /// Resolves the output dimensions for a source of `src_width` x `src_height`
    pub fn resolve(&self, src_width: u32, src_height: u32) -> (u32, u32) {
        let scaled = |num: u32, target: u32, den: u32| -> u32 {
            if den == 0 {
                return num;
            }
            ((num as u64 * target as u64 + den as u64 / 2) / den as u64).max(1) as u32
        };

        match (self.width, self.height) {
            (Some(width), Some(height)) => (width.max(1), height.max(1)),
            (Some(width), None) => (width.max(1), scaled(src_height, width, src_width)),
            (None, Some(height)) => (scaled(src_width, height, src_height), height.max(1)),
            (None, None) => (src_width, src_height),
        }
    }
}

/// Returns the common size of `frames`, rejecting empty input and mixed sizes
pub fn canvas_size(frames: &[&RgbaImage]) -> Result<(u32, u32), EncodeError> {
    let first = frames.first().ok_or(EncodeError::NoFrames)?;
    let (expected_width, expected_height) = first.dimensions();

    for (index, frame) in frames.iter().enumerate().skip(1) {
        let (width, height) = frame.dimensions();
        if (width, height) != (expected_width, expected_height) {
            return Err(EncodeError::FrameSizeMismatch {
                index,
                width,
                height,
                expected_width,
                expected_height,
            });
        }
    }

    Ok((expected_width, expected_height))
}

pub fn check_fps(fps: f64) -> Result<(), EncodeError> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(EncodeError::InvalidFps(fps))
    }
}

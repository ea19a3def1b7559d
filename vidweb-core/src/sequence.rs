//! Decoded frame sequences

use crate::{Error, Result};

/// An ordered, non-empty run of decoded frames and the real-time span they cover
#[derive(Debug, Clone)]
pub struct FrameSequence<F> {
    frames: Vec<F>,
    duration: f64,
}

impl<F> FrameSequence<F> {
    /// Creates a sequence, rejecting empty input and non-positive durations
    pub fn new(frames: Vec<F>, duration: f64) -> Result<Self> {
        if frames.is_empty() {
            return Err(Error::EmptyInput);
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(Error::InvalidDuration(duration));
        }
        Ok(Self { frames, duration })
    }

    /// Number of frames in the sequence
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false for a constructed sequence
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn frames(&self) -> &[F] {
        &self.frames
    }

    /// Frame rate that plays `count` frames over the full duration
    pub fn timing_fps(&self, count: usize) -> f64 {
        count as f64 / self.duration
    }
}

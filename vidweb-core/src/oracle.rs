//! Encoder boundary used by the search

/// Failure of a single encode trial
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("No frames to encode")]
    NoFrames,

    #[error("Frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("Frame dimensions {width}x{height} are not supported by {codec}")]
    UnsupportedDimensions {
        codec: &'static str,
        width: u32,
        height: u32,
    },

    #[error("Invalid frame rate: {0}")]
    InvalidFps(f64),

    #[error("{codec} encode error: {reason}")]
    Codec { codec: &'static str, reason: String },
}

/// Maps a frame subset, a quality level and a frame rate to an encoded buffer.
///
/// The search only looks at the length of the returned buffer. Implementations
/// must be callable repeatedly with different parameters and must report any
/// failure as an error, never as a truncated buffer.
pub trait EncodeOracle {
    type Frame;

    /// Short format name used in log output
    fn name(&self) -> &'static str;

    fn encode(
        &self,
        frames: &[&Self::Frame],
        quality: u8,
        fps: f64,
    ) -> Result<Vec<u8>, EncodeError>;
}

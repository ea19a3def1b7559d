//! vidweb Encoder Library
//!
//! This library decodes video files with FFmpeg and encodes the decoded frames
//! into size-limited animated WebP or GIF images.

pub mod convert;
pub mod frames;
pub mod gif_encoder;
pub mod video_reader;
pub mod webp_encoder;

pub use convert::{
    write_output, ConversionReport, ConvertOptions, Converter, Encoded, OutputFormat, SearchDetails,
    UNBOUNDED_FRAME_CAP,
};
pub use frames::FrameSize;
pub use gif_encoder::GifEncoder;
pub use video_reader::VideoReader;
pub use webp_encoder::WebpEncoder;

use std::path::PathBuf;

/// Result type for vidweb-encoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for vidweb-encoder operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vidweb core error: {0}")]
    Core(#[from] vidweb_core::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] vidweb_core::EncodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("Video file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid video frame data")]
    InvalidVideo,

    #[error("No video stream found")]
    NoVideoStream,
}

//! vidweb Decoder Library
//!
//! This library reads back animated WebP and GIF files and reports their
//! canvas size, frame count and timing without decoding any pixels.

pub mod gif_info;
pub mod webp_info;

use std::fs;
use std::path::Path;

/// Result type for vidweb-decoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for vidweb-decoder operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GIF decode error: {0}")]
    Gif(#[from] gif::DecodingError),

    #[error("Unrecognised image format")]
    UnknownFormat,

    #[error("Malformed {format} data: {reason}")]
    Malformed {
        format: &'static str,
        reason: String,
    },
}

/// Container format of an inspected image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ImageFormat {
    Webp,
    Gif,
}

/// Summary of an animated (or still) image
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    /// Sum of all frame durations
    pub duration_ms: u64,
    /// Loop count from the container (0 = forever), when the format stores one
    pub loop_count: Option<u16>,
    pub animated: bool,
    pub size_bytes: u64,
}

impl ImageInfo {
    /// Average playback rate, if the image has timing information
    pub fn fps(&self) -> Option<f64> {
        if self.duration_ms == 0 || self.frame_count == 0 {
            return None;
        }
        Some(self.frame_count as f64 * 1000.0 / self.duration_ms as f64)
    }
}

/// Inspects an in-memory image, detecting the format from its magic bytes
pub fn inspect(data: &[u8]) -> Result<ImageInfo> {
    if data.starts_with(b"RIFF") {
        webp_info::read_webp_info(data)
    } else if data.starts_with(b"GIF8") {
        gif_info::read_gif_info(data)
    } else {
        Err(Error::UnknownFormat)
    }
}

/// Reads and inspects an image file
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<ImageInfo> {
    let data = fs::read(path)?;
    inspect(&data)
}

//! Animated GIF encoding
//!
//! GIF has no quality parameter of its own, so quality sets the palette size:
//! each frame is quantised with NeuQuant to between 2 colours (quality 1) and
//! 256 colours (quality 100). Fewer colours mean narrower LZW codes and a
//! smaller file.

use crate::frames::{canvas_size, check_fps};
use color_quant::NeuQuant;
use gif::{Encoder, Frame, Repeat};
use image::RgbaImage;
use vidweb_core::{EncodeError, EncodeOracle};

const CODEC: &str = "gif";

/// Animated GIF encoder with a per-frame palette sized by quality
#[derive(Debug, Clone)]
pub struct GifEncoder {
    /// NeuQuant sampling factor (1 = best palette, 30 = fastest)
    pub speed: i32,
}

impl Default for GifEncoder {
    fn default() -> Self {
        Self { speed: 10 }
    }
}

impl EncodeOracle for GifEncoder {
    type Frame = RgbaImage;

    fn name(&self) -> &'static str {
        CODEC
    }

    fn encode(
        &self,
        frames: &[&RgbaImage],
        quality: u8,
        fps: f64,
    ) -> Result<Vec<u8>, EncodeError> {
        let (width, height) = canvas_size(frames)?;
        check_fps(fps)?;

        let (Ok(gif_width), Ok(gif_height)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(EncodeError::UnsupportedDimensions {
                codec: CODEC,
                width,
                height,
            });
        };

        let colors = palette_size(quality);
        let delay = frame_delay(fps);
        let speed = self.speed.clamp(1, 30);

        let mut buffer = Vec::new();
        let mut encoder =
            Encoder::new(&mut buffer, gif_width, gif_height, &[]).map_err(codec_error)?;
        encoder.set_repeat(Repeat::Infinite).map_err(codec_error)?;

        for image in frames {
            let (palette, indices) = quantize(image.as_raw(), colors, speed);
            let mut gif_frame =
                Frame::from_palette_pixels(gif_width, gif_height, indices, palette, None);
            gif_frame.delay = delay;
            encoder.write_frame(&gif_frame).map_err(codec_error)?;
        }

        // Writes the trailer
        encoder.into_inner().map_err(codec_error)?;

        Ok(buffer)
    }
}

fn codec_error(err: impl std::fmt::Display) -> EncodeError {
    EncodeError::Codec {
        codec: CODEC,
        reason: err.to_string(),
    }
}

/// Palette entries used per frame (2 at quality 1, 256 at quality 100)
fn palette_size(quality: u8) -> usize {
    let quality = quality.clamp(1, 100) as usize;
    2 + (quality - 1) * 254 / 99
}

/// Builds an RGB palette of `colors` entries for `rgba` and maps every pixel onto it.
///
/// Alpha is ignored: decoded video frames are opaque.
fn quantize(rgba: &[u8], colors: usize, speed: i32) -> (Vec<u8>, Vec<u8>) {
    let quantizer = NeuQuant::new(speed, colors, rgba);
    let indices = rgba
        .chunks_exact(4)
        .map(|px| quantizer.index_of(px) as u8)
        .collect();
    (quantizer.color_map_rgb(), indices)
}

/// Frame delay in hundredths of a second
fn frame_delay(fps: f64) -> u16 {
    (100.0 / fps).round().clamp(1.0, u16::MAX as f64) as u16
}

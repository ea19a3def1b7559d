//! Animated WebP encoding

use crate::frames::{canvas_size, check_fps};
use image::RgbaImage;
use vidweb_core::{EncodeError, EncodeOracle};
use webp::{AnimEncoder, AnimFrame, WebPConfig};

const CODEC: &str = "webp";

/// Lossy animated WebP encoder backed by libwebp
#[derive(Debug, Clone)]
pub struct WebpEncoder {
    /// libwebp compression method (0 = fastest, 6 = smallest output)
    pub method: i32,
}

impl Default for WebpEncoder {
    fn default() -> Self {
        Self { method: 4 }
    }
}

impl EncodeOracle for WebpEncoder {
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

        let mut config = WebPConfig::new().map_err(|_| EncodeError::Codec {
            codec: CODEC,
            reason: "could not initialise encoder configuration".to_string(),
        })?;
        config.lossless = 0;
        config.quality = quality.min(100) as f32;
        config.method = self.method.clamp(0, 6);

        let mut encoder = AnimEncoder::new(width, height, &config);
        for (index, frame) in frames.iter().enumerate() {
            encoder.add_frame(AnimFrame::from_rgba(
                frame.as_raw(),
                width,
                height,
                timestamp_ms(index, fps),
            ));
        }

        let encoded = encoder.try_encode().map_err(|e| EncodeError::Codec {
            codec: CODEC,
            reason: format!("{:?}", e),
        })?;

        Ok(encoded.to_vec())
    }
}

/// Start time of frame `index` in milliseconds
fn timestamp_ms(index: usize, fps: f64) -> i32 {
    (index as f64 * 1000.0 / fps).round().min(i32::MAX as f64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32, shift: u8) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                (x as u8).wrapping_mul(7).wrapping_add(shift),
                (y as u8).wrapping_mul(5),
                shift,
                255,
            ])
        })
    }

    #[test]
    fn test_encode_animation() {
        let frames: Vec<RgbaImage> = (0..3).map(|i| gradient(32, 24, i * 40)).collect();
        let refs: Vec<&RgbaImage> = frames.iter().collect();

        let data = WebpEncoder::default().encode(&refs, 75, 10.0).unwrap();

        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WEBP");
    }

    #[test]
    fn test_rejects_bad_input() {
        let encoder = WebpEncoder::default();
        assert_eq!(encoder.encode(&[], 75, 10.0), Err(EncodeError::NoFrames));

        let frame = gradient(8, 8, 0);
        assert_eq!(
            encoder.encode(&[&frame], 75, 0.0),
            Err(EncodeError::InvalidFps(0.0))
        );
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(timestamp_ms(0, 15.0), 0);
        assert_eq!(timestamp_ms(3, 15.0), 200);
        assert_eq!(timestamp_ms(1, 3.0), 333);
    }
}

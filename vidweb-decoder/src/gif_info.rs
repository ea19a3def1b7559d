//! GIF stream inspection

use crate::{ImageFormat, ImageInfo, Result};
use gif::{ColorOutput, DecodeOptions, Repeat};
use std::io::Cursor;

/// Reads the logical screen and sums the frame delays of a GIF.
///
/// Only frame headers are parsed; image data is skipped undecoded.
pub fn read_gif_info(data: &[u8]) -> Result<ImageInfo> {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::Indexed);
    let mut decoder = options.read_info(Cursor::new(data))?;

    let width = decoder.width() as u32;
    let height = decoder.height() as u32;

    let mut frame_count = 0u32;
    let mut duration_ms = 0u64;
    while let Some(frame) = decoder.next_frame_info()? {
        frame_count += 1;
        // Delays are stored in hundredths of a second
        duration_ms += frame.delay as u64 * 10;
    }

    // The loop extension sits before the first frame, so it is known by now
    let loop_count = match decoder.repeat() {
        Repeat::Infinite => Some(0),
        Repeat::Finite(0) => None,
        Repeat::Finite(count) => Some(count),
    };

    Ok(ImageInfo {
        format: ImageFormat::Gif,
        width,
        height,
        frame_count,
        duration_ms,
        loop_count,
        animated: frame_count > 1,
        size_bytes: data.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{inspect, inspect_file, Error};
    use gif::{Encoder, Frame, Repeat};

    fn animation(frames: u16, delay: u16) -> Vec<u8> {
        looping_animation(frames, delay, Repeat::Infinite)
    }

    fn looping_animation(frames: u16, delay: u16, repeat: Repeat) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = Encoder::new(&mut out, 16, 8, &[0, 0, 0, 255, 255, 255]).unwrap();
            encoder.set_repeat(repeat).unwrap();
            for i in 0..frames {
                let mut frame = Frame::default();
                frame.width = 16;
                frame.height = 8;
                frame.delay = delay;
                frame.buffer = vec![(i % 2) as u8; 16 * 8].into();
                encoder.write_frame(&frame).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_animated_gif() {
        let data = animation(4, 5);
        let info = read_gif_info(&data).unwrap();

        assert_eq!(info.format, ImageFormat::Gif);
        assert_eq!((info.width, info.height), (16, 8));
        assert_eq!(info.frame_count, 4);
        assert_eq!(info.duration_ms, 200);
        assert!(info.animated);
        assert_eq!(info.fps(), Some(20.0));
        assert_eq!(info.loop_count, Some(0));
    }

    #[test]
    fn test_finite_loop_count() {
        let info = read_gif_info(&looping_animation(3, 10, Repeat::Finite(3))).unwrap();
        assert_eq!(info.frame_count, 3);
        assert_eq!(info.duration_ms, 300);
        assert_eq!(info.loop_count, Some(3));
    }

    #[test]
    fn test_inspect_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.gif");
        std::fs::write(&path, animation(2, 10)).unwrap();

        let info = inspect_file(&path).unwrap();
        assert_eq!(info.frame_count, 2);
        assert_eq!(info.size_bytes, std::fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_truncated_gif() {
        let data = animation(2, 10);
        assert!(matches!(inspect(&data[..8]), Err(Error::Gif(_))));
    }
}

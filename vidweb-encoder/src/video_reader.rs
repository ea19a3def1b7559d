//! Video reading and frame extraction using FFmpeg

use crate::{Error, FrameSize, Result};
use ffmpeg_next as ffmpeg;
use image::RgbaImage;
use log::{debug, info};
use std::path::Path;
use std::sync::OnceLock;
use vidweb_core::FrameSequence;

/// Frame rate assumed when the stream does not report one
const DEFAULT_FPS: f64 = 30.0;

static FFMPEG_INIT: OnceLock<std::result::Result<(), ffmpeg::Error>> = OnceLock::new();

/// Initialize FFmpeg once per process
fn init_ffmpeg() -> Result<()> {
    (*FFMPEG_INIT.get_or_init(ffmpeg::init)).map_err(Error::from)
}

/// Video reader that extracts frames from video files
pub struct VideoReader {
    input: ffmpeg::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    frame_rate: f64,
    reported_duration: Option<f64>,
}

impl VideoReader {
    /// Opens a video file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        init_ffmpeg()?;

        let input = ffmpeg::format::input(&path)?;

        // Find the video stream
        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(Error::NoVideoStream)?;

        let video_stream_index = video_stream.index();
        let frame_rate = positive_rate(video_stream.avg_frame_rate())
            .or_else(|| positive_rate(video_stream.rate()))
            .unwrap_or(DEFAULT_FPS);

        // Stream duration first, then the container's
        let stream_duration = video_stream.duration();
        let time_base = video_stream.time_base();
        let reported_duration = if stream_duration > 0 && time_base.denominator() != 0 {
            Some(stream_duration as f64 * f64::from(time_base))
        } else if input.duration() > 0 {
            Some(input.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64)
        } else {
            None
        };

        let context = ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())?;
        let decoder = context.decoder().video()?;

        Ok(Self {
            input,
            video_stream_index,
            decoder,
            frame_rate,
            reported_duration,
        })
    }

    /// Gets the video width
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /// Gets the video height
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /// Gets the average frame rate
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Duration in seconds as reported by the stream or container, if any
    pub fn reported_duration(&self) -> Option<f64> {
        self.reported_duration
    }

    /// Decodes every frame, scaled to `size`
    pub fn read_frames(&mut self, size: FrameSize) -> Result<Vec<RgbaImage>> {
        let (src_width, src_height) = (self.width(), self.height());
        let (width, height) = size.resolve(src_width, src_height);
        let flags = if (width, height) == (src_width, src_height) {
            ffmpeg::software::scaling::Flags::BILINEAR
        } else {
            ffmpeg::software::scaling::Flags::LANCZOS
        };

        let mut scaler = ffmpeg::software::scaling::Context::get(
            self.decoder.format(),
            src_width,
            src_height,
            ffmpeg::format::Pixel::RGBA,
            width,
            height,
            flags,
        )?;

        let mut frames = Vec::new();

        let mut receive_and_process_decoded_frames =
            |decoder: &mut ffmpeg::decoder::Video| -> Result<()> {
                let mut decoded = ffmpeg::frame::Video::empty();
                while decoder.receive_frame(&mut decoded).is_ok() {
                    let mut rgba_frame = ffmpeg::frame::Video::empty();
                    scaler.run(&decoded, &mut rgba_frame)?;
                    frames.push(frame_to_image(&rgba_frame)?);
                }
                Ok(())
            };

        // Read packets and decode
        for (stream, packet) in self.input.packets() {
            if stream.index() == self.video_stream_index {
                self.decoder.send_packet(&packet)?;
                receive_and_process_decoded_frames(&mut self.decoder)?;
            }
        }

        // Flush decoder
        self.decoder.send_eof()?;
        receive_and_process_decoded_frames(&mut self.decoder)?;

        debug!("Decoded {} frames at {}x{}", frames.len(), width, height);
        Ok(frames)
    }

    /// Decodes the whole video into a frame sequence with its real-time duration.
    ///
    /// Falls back to `frames / frame rate` when no duration is reported.
    pub fn read_sequence(&mut self, size: FrameSize) -> Result<FrameSequence<RgbaImage>> {
        let frames = self.read_frames(size)?;
        let duration = self
            .reported_duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(frames.len() as f64 / self.frame_rate);

        info!(
            "Video details: {} frames, {:.2}s duration, {}x{} source @ {:.2} fps",
            frames.len(),
            duration,
            self.width(),
            self.height(),
            self.frame_rate
        );

        Ok(FrameSequence::new(frames, duration)?)
    }
}

fn positive_rate(rate: ffmpeg::Rational) -> Option<f64> {
    if rate.numerator() > 0 && rate.denominator() > 0 {
        Some(f64::from(rate))
    } else {
        None
    }
}

/// Copies a packed RGBA frame into an image, dropping any row padding
fn frame_to_image(frame: &ffmpeg::frame::Video) -> Result<RgbaImage> {
    let width = frame.width();
    let height = frame.height();
    let stride = frame.stride(0);
    let row_bytes = width as usize * 4;
    let data = frame.data(0);

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        let row = data
            .get(start..start + row_bytes)
            .ok_or(Error::InvalidVideo)?;
        pixels.extend_from_slice(row);
    }

    RgbaImage::from_raw(width, height, pixels).ok_or(Error::InvalidVideo)
}

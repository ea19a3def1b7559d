//! Video to animated image conversion pipeline

use crate::{FrameSize, GifEncoder, Result, VideoReader, WebpEncoder};
use image::RgbaImage;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use vidweb_core::{
    sampler, EncodeOracle, Fit, FrameSequence, SearchConfig, Stage, StageOrchestrator, Timing,
    TrialRecord,
};

/// Animated image container written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutputFormat {
    Webp,
    Gif,
}

impl OutputFormat {
    /// Guesses the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "webp" => Some(OutputFormat::Webp),
            "gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Gif => "gif",
        }
    }

    /// Encoder with default settings for this format
    pub fn encoder(&self) -> Box<dyn EncodeOracle<Frame = RgbaImage>> {
        match self {
            OutputFormat::Webp => Box::new(WebpEncoder::default()),
            OutputFormat::Gif => Box::new(GifEncoder::default()),
        }
    }
}

/// Frame cap used when the size limit is off
pub const UNBOUNDED_FRAME_CAP: u32 = 180;

/// Conversion settings
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub frame_size: FrameSize,
    pub format: OutputFormat,
    pub search: SearchConfig,
    /// When false, encode once at the configured quality and ignore the size window
    pub size_limit: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            frame_size: FrameSize::default(),
            format: OutputFormat::Webp,
            search: SearchConfig::default(),
            size_limit: true,
        }
    }
}

impl ConvertOptions {
    /// Settings for a single encode with no size limit, keeping up to
    /// [`UNBOUNDED_FRAME_CAP`] frames
    pub fn unbounded() -> Self {
        Self {
            search: SearchConfig {
                max_frame_cap: UNBOUNDED_FRAME_CAP,
                ..SearchConfig::default()
            },
            size_limit: false,
            ..Self::default()
        }
    }
}

/// How the size search ended
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SearchDetails {
    pub stage: Stage,
    pub fit: Fit,
    pub trials: Vec<TrialRecord>,
}

/// An encoded image and the parameters that produced it
#[derive(Debug, Clone)]
pub struct Encoded {
    pub buffer: Vec<u8>,
    pub frame_count: u32,
    pub quality: u8,
    pub fps: f64,
    /// Absent when the size limit is disabled
    pub search: Option<SearchDetails>,
}

/// Summary of a finished conversion
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub source_frames: usize,
    pub source_duration: f64,
    pub frame_count: u32,
    pub quality: u8,
    pub fps: f64,
    pub size: u64,
    pub search: Option<SearchDetails>,
    pub elapsed_secs: f64,
}

/// Converts video files to animated images
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Decodes `input`, encodes it within the configured limits and writes `output`
    pub fn convert(&self, input: &Path, output: &Path) -> Result<ConversionReport> {
        let start = Instant::now();
        self.options.search.validate()?;

        info!("Decoding all frames of {}", input.display());
        let mut reader = VideoReader::open(input)?;
        let sequence = reader.read_sequence(self.options.frame_size)?;

        let encoder = self.options.format.encoder();
        let encoded = self.encode_sequence(encoder.as_ref(), &sequence)?;

        info!(
            "Saving final {} to {}",
            self.options.format.extension(),
            output.display()
        );
        write_output(output, &encoded.buffer)?;

        let elapsed_secs = start.elapsed().as_secs_f64();
        info!("Total time taken: {:.2} seconds", elapsed_secs);

        Ok(ConversionReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            format: self.options.format,
            source_frames: sequence.len(),
            source_duration: sequence.duration(),
            frame_count: encoded.frame_count,
            quality: encoded.quality,
            fps: encoded.fps,
            size: encoded.buffer.len() as u64,
            search: encoded.search,
            elapsed_secs,
        })
    }

    /// Encodes already decoded frames, running the size search unless it is disabled
    pub fn encode_sequence<O>(
        &self,
        encoder: &O,
        sequence: &FrameSequence<O::Frame>,
    ) -> Result<Encoded>
    where
        O: EncodeOracle + ?Sized,
    {
        let config = &self.options.search;

        if !self.options.size_limit {
            let count = sequence.len().min(config.max_frame_cap as usize);
            let frames = sampler::select(sequence.frames(), count);
            let fps = match config.timing {
                Timing::Preserve => sequence.timing_fps(frames.len()),
                Timing::Fixed(fps) => fps,
            };
            if sequence.len() > count {
                info!(
                    "Video has {} frames, limiting to {} frames",
                    sequence.len(),
                    count
                );
            }
            let buffer = encoder.encode(&frames, config.quality_ceiling, fps)?;
            return Ok(Encoded {
                buffer,
                frame_count: frames.len() as u32,
                quality: config.quality_ceiling,
                fps,
                search: None,
            });
        }

        let outcome = StageOrchestrator::new(encoder, sequence, config)?.run()?;

        Ok(Encoded {
            frame_count: outcome.frame_count,
            quality: outcome.quality,
            fps: outcome.fps,
            search: Some(SearchDetails {
                stage: outcome.stage,
                fit: outcome.fit,
                trials: outcome.trials,
            }),
            buffer: outcome.buffer,
        })
    }
}

/// Writes `data` to `path`, creating the parent directory first
pub fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, data)?;
    Ok(())
}

//! Staged fallback search for an encode that fits the size window
//!
//! The stages run in a fixed order and stop at the first one that produces an
//! accepted result:
//!
//! | stage                | frames            | quality           |
//! |----------------------|-------------------|-------------------|
//! | initial              | `effective`       | `q`               |
//! | frame count          | `[pivot, effective]` searched | `q`   |
//! | quality              | `pivot`           | `[q/2, q]` searched |
//! | reduced frame count  | `[1, pivot]` searched | `q/2`         |
//! | single frame         | 1                 | `[1, q/2]` searched |
//! | last resort          | 1                 | 1                 |
//!
//! where `effective = min(frames available, frame cap)` and `pivot = effective / 2`.

use std::fmt;

use log::{debug, info, warn};

use crate::{
    bounded_search, sampler, EncodeError, EncodeOracle, Error, FrameSequence, Result,
    SearchConfig, SearchHit, SearchSpace, SizeTargetRange, Timing,
};

/// One step of the fallback sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    Initial,
    FrameCount,
    Quality,
    ReducedFrameCount,
    SingleFrame,
    LastResort,
}

impl Stage {
    /// Short label used in logs ("A" to "E", then "fallback")
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Initial => "A",
            Stage::FrameCount => "B",
            Stage::Quality => "C",
            Stage::ReducedFrameCount => "D",
            Stage::SingleFrame => "E",
            Stage::LastResort => "fallback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the final size landed relative to the target window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fit {
    InWindow,
    UnderWindow,
    OverCap,
}

impl Fit {
    pub fn of(size: u64, target: SizeTargetRange) -> Self {
        if size > target.max {
            Fit::OverCap
        } else if size < target.min {
            Fit::UnderWindow
        } else {
            Fit::InWindow
        }
    }
}

/// A single oracle call made during the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialRecord {
    pub stage: Stage,
    pub frame_count: u32,
    pub quality: u8,
    /// Encoded size, `None` when the encode failed
    pub size: Option<u64>,
}

/// The accepted encode and how it was found
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub frame_count: u32,
    pub quality: u8,
    pub fps: f64,
    pub stage: Stage,
    pub fit: Fit,
    pub buffer: Vec<u8>,
    pub trials: Vec<TrialRecord>,
}

impl SearchOutcome {
    pub fn size(&self) -> u64 {
        self.buffer.len() as u64
    }
}

#[derive(Debug)]
struct Held {
    stage: Stage,
    frame_count: u32,
    quality: u8,
    fps: f64,
    buffer: Vec<u8>,
}

impl Held {
    fn size(&self) -> u64 {
        self.buffer.len() as u64
    }
}

/// Runs the staged search for one frame sequence and owns the best buffer found.
pub struct StageOrchestrator<'a, O: EncodeOracle + ?Sized> {
    oracle: &'a O,
    sequence: &'a FrameSequence<O::Frame>,
    config: &'a SearchConfig,
    held: Option<Held>,
    trials: Vec<TrialRecord>,
    last_error: Option<EncodeError>,
}

impl<'a, O: EncodeOracle + ?Sized> StageOrchestrator<'a, O> {
    pub fn new(
        oracle: &'a O,
        sequence: &'a FrameSequence<O::Frame>,
        config: &'a SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            oracle,
            sequence,
            config,
            held: None,
            trials: Vec::new(),
            last_error: None,
        })
    }

    /// Runs the stages in order and returns the held encode.
    ///
    /// Fails only when no trial at all produced a buffer.
    pub fn run(mut self) -> Result<SearchOutcome> {
        let target = self.config.size_target;
        let available = u32::try_from(self.sequence.len()).unwrap_or(u32::MAX);
        let effective = available.min(self.config.max_frame_cap);
        let pivot = effective / 2;
        let quality = self.config.quality_ceiling;
        let half_quality = quality / 2;

        info!(
            "Stage A: {} frames @ Q={} ({} encoder, window {:.1}KB-{:.1}KB)",
            effective,
            quality,
            self.oracle.name(),
            kib(target.min),
            kib(target.max)
        );
        match self.trial(Stage::Initial, effective, quality) {
            Some(size) if size <= target.max => {
                info!("Stage A fits at {:.1}KB, no further search", kib(size));
                return self.finish();
            }
            Some(size) => info!("Too big ({:.1}KB), starting staged search", kib(size)),
            None => info!("Stage A encode failed, starting staged search"),
        }

        let space = SearchSpace::new(pivot, effective);
        info!(
            "Stage B: searching frame count in [{}, {}] @ Q={}",
            space.low, space.high, quality
        );
        if self.search_frames(Stage::FrameCount, space, quality).is_some() {
            return self.finish();
        }

        let pinned_frames = pivot.max(1);
        let space = SearchSpace::new(half_quality as u32, quality as u32);
        info!(
            "Stage C: fixing {} frames, searching quality in [{}, {}]",
            pinned_frames, space.low, space.high
        );
        if self.search_quality(Stage::Quality, pinned_frames, space).is_some() {
            return self.finish();
        }

        let reduced_quality = half_quality.max(1);
        let space = SearchSpace::new(1, pivot);
        info!(
            "Stage D: fixing Q={}, searching frame count in [{}, {}]",
            reduced_quality, space.low, space.high
        );
        if self
            .search_frames(Stage::ReducedFrameCount, space, reduced_quality)
            .is_some()
        {
            return self.finish();
        }

        let space = SearchSpace::new(1, half_quality as u32);
        info!(
            "Stage E: fixing 1 frame, searching quality in [{}, {}]",
            space.low, space.high
        );
        if self.search_quality(Stage::SingleFrame, 1, space).is_some() {
            return self.finish();
        }

        info!("Last resort: 1 frame @ Q=1");
        self.trial(Stage::LastResort, 1, 1);
        self.finish()
    }

    fn search_frames(
        &mut self,
        stage: Stage,
        space: SearchSpace,
        quality: u8,
    ) -> Option<SearchHit> {
        let target = self.config.size_target;
        let hit = bounded_search(target, space, |count| self.trial(stage, count, quality));
        if let Some(hit) = hit {
            info!(
                "Stage {} found {} frames @ Q={}, {:.1}KB",
                stage.label(),
                hit.value,
                quality,
                kib(hit.size)
            );
        }
        hit
    }

    fn search_quality(
        &mut self,
        stage: Stage,
        frame_count: u32,
        space: SearchSpace,
    ) -> Option<SearchHit> {
        let target = self.config.size_target;
        let space = SearchSpace::new(space.low, space.high.min(100));
        let hit = bounded_search(target, space, |quality| {
            self.trial(stage, frame_count, quality as u8)
        });
        if let Some(hit) = hit {
            info!(
                "Stage {} found {} frames @ Q={}, {:.1}KB",
                stage.label(),
                frame_count,
                hit.value,
                kib(hit.size)
            );
        }
        hit
    }

    /// Encodes one (frame count, quality) pair and returns the encoded size.
    fn trial(&mut self, stage: Stage, frame_count: u32, quality: u8) -> Option<u64> {
        let frames = sampler::select(self.sequence.frames(), frame_count as usize);
        let selected = frames.len() as u32;
        let fps = match self.config.timing {
            Timing::Preserve => self.sequence.timing_fps(frames.len()),
            Timing::Fixed(fps) => fps,
        };

        let size = match self.oracle.encode(&frames, quality, fps) {
            Ok(buffer) => {
                let size = buffer.len() as u64;
                debug!(
                    "  [{}] {} frames @ Q={} ({:.2} fps) -> {:.1}KB",
                    stage.label(),
                    selected,
                    quality,
                    fps,
                    kib(size)
                );
                self.offer(Held {
                    stage,
                    frame_count: selected,
                    quality,
                    fps,
                    buffer,
                });
                Some(size)
            }
            Err(err) => {
                warn!(
                    "  [{}] {} frames @ Q={} failed: {}",
                    stage.label(),
                    selected,
                    quality,
                    err
                );
                self.last_error = Some(err);
                None
            }
        };

        self.trials.push(TrialRecord {
            stage,
            frame_count: selected,
            quality,
            size,
        });
        size
    }

    /// Replaces the held buffer unless that would swap an under-cap buffer for an over-cap one.
    fn offer(&mut self, candidate: Held) {
        let max = self.config.size_target.max;
        let replace = match &self.held {
            None => true,
            Some(held) => candidate.size() <= max || held.size() > max,
        };
        if replace {
            self.held = Some(candidate);
        }
    }

    fn finish(self) -> Result<SearchOutcome> {
        let target = self.config.size_target;
        let Some(held) = self.held else {
            return Err(Error::ProductionFailure(
                self.last_error.unwrap_or(EncodeError::NoFrames),
            ));
        };

        let size = held.size();
        let fit = Fit::of(size, target);
        match fit {
            Fit::InWindow => {}
            Fit::UnderWindow if held.stage == Stage::Initial => {}
            Fit::UnderWindow => warn!(
                "Size window {:.1}KB-{:.1}KB not met, using {:.1}KB from stage {}",
                kib(target.min),
                kib(target.max),
                kib(size),
                held.stage.label()
            ),
            Fit::OverCap => warn!(
                "Could not get under {:.1}KB, using {:.1}KB from stage {}",
                kib(target.max),
                kib(size),
                held.stage.label()
            ),
        }

        Ok(SearchOutcome {
            frame_count: held.frame_count,
            quality: held.quality,
            fps: held.fps,
            stage: held.stage,
            fit,
            buffer: held.buffer,
            trials: self.trials,
        })
    }
}

fn kib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

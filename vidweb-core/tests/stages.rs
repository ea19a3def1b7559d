//! End-to-end runs of the staged search against synthetic encoders.

use std::cell::Cell;

use vidweb_core::{
    EncodeError, EncodeOracle, Fit, FrameSequence, SearchConfig, SizeTargetRange, Stage,
    StageOrchestrator, Timing,
};

const KB: u64 = 1024;

/// Encoder whose output size is a pure function of frame count and quality
struct ModelEncoder<F> {
    size_kb: F,
    calls: Cell<usize>,
}

fn model<F: Fn(u64, u64) -> u64>(size_kb: F) -> ModelEncoder<F> {
    ModelEncoder {
        size_kb,
        calls: Cell::new(0),
    }
}

impl<F: Fn(u64, u64) -> u64> EncodeOracle for ModelEncoder<F> {
    type Frame = usize;

    fn name(&self) -> &'static str {
        "model"
    }

    fn encode(&self, frames: &[&usize], quality: u8, _fps: f64) -> Result<Vec<u8>, EncodeError> {
        self.calls.set(self.calls.get() + 1);
        if frames.is_empty() {
            return Err(EncodeError::NoFrames);
        }
        let size = (self.size_kb)(frames.len() as u64, quality as u64) * KB;
        Ok(vec![0xAB; size as usize])
    }
}

fn sixty_frames() -> FrameSequence<usize> {
    FrameSequence::new((0..60).collect(), 4.0).unwrap()
}

fn window_config() -> SearchConfig {
    SearchConfig {
        quality_ceiling: 80,
        max_frame_cap: 30,
        size_target: SizeTargetRange::new(390 * KB, 490 * KB),
        timing: Timing::Preserve,
    }
}

#[test]
fn frame_count_search_finds_window() {
    // 30 frames → 650KB, 22 frames → 450KB
    let encoder = model(|frames, quality| (25 * frames).saturating_sub(100).max(1) * quality / 80);
    let frames = sixty_frames();
    let config = window_config();

    let outcome = StageOrchestrator::new(&encoder, &frames, &config)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(outcome.trials[0].size, Some(650 * KB));
    assert_eq!(outcome.stage, Stage::FrameCount);
    assert_eq!(outcome.frame_count, 22);
    assert_eq!(outcome.quality, 80);
    assert_eq!(outcome.size(), 450 * KB);
    assert_eq!(outcome.fit, Fit::InWindow);
    assert!((outcome.fps - 22.0 / 4.0).abs() < 1e-9);
}

#[test]
fn oversized_source_falls_through_to_last_resort() {
    let encoder = model(|frames, quality| 500 + frames + quality);
    let frames = sixty_frames();
    let config = window_config();

    let outcome = StageOrchestrator::new(&encoder, &frames, &config)
        .unwrap()
        .run()
        .unwrap();

    let mut order: Vec<Stage> = outcome.trials.iter().map(|t| t.stage).collect();
    order.dedup();
    assert_eq!(
        order,
        vec![
            Stage::Initial,
            Stage::FrameCount,
            Stage::Quality,
            Stage::ReducedFrameCount,
            Stage::SingleFrame,
            Stage::LastResort,
        ]
    );
    assert_eq!(outcome.stage, Stage::LastResort);
    assert_eq!(outcome.frame_count, 1);
    assert_eq!(outcome.quality, 1);
    assert_eq!(outcome.fit, Fit::OverCap);
    assert_eq!(outcome.size(), 502 * KB);
    assert_eq!(encoder.calls.get(), outcome.trials.len());
}

#[test]
fn stage_d_uses_half_quality() {
    // Only small frame counts at reduced quality fit
    let encoder = model(|frames, quality| frames * quality);
    let frames = sixty_frames();
    let config = window_config();

    let outcome = StageOrchestrator::new(&encoder, &frames, &config)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(outcome.stage, Stage::ReducedFrameCount);
    assert_eq!(outcome.quality, 40);
    assert!(outcome.frame_count <= 15);
    assert!(config.size_target.contains(outcome.size()));
}

#[test]
fn result_never_exceeds_cap_when_anything_fits() {
    for slope in [3u64, 17, 40, 90, 200, 390] {
        let encoder = model(move |frames, quality| slope * frames * quality / 80 + 5);
        let frames = sixty_frames();
        let config = window_config();

        let outcome = StageOrchestrator::new(&encoder, &frames, &config)
            .unwrap()
            .run()
            .unwrap();

        assert!(
            outcome.size() <= config.size_target.max,
            "slope {slope} gave {} bytes",
            outcome.size()
        );
    }
}

#[test]
fn repeated_runs_are_identical() {
    let encoder = model(|frames, quality| 7 * frames + 3 * quality);
    let frames = sixty_frames();
    let config = SearchConfig {
        size_target: SizeTargetRange::new(200 * KB, 260 * KB),
        ..window_config()
    };

    let first = StageOrchestrator::new(&encoder, &frames, &config)
        .unwrap()
        .run()
        .unwrap();
    let second = StageOrchestrator::new(&encoder, &frames, &config)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(first.size(), second.size());
    assert_eq!(first.trials, second.trials);
    assert_eq!(first.buffer, second.buffer);
}

#[test]
fn empty_input_is_rejected_before_search() {
    let result = FrameSequence::<usize>::new(Vec::new(), 1.0);
    assert!(matches!(result, Err(vidweb_core::Error::EmptyInput)));
}

//! vidweb Core Library
//!
//! This library provides the size-constrained parameter search used to turn a
//! decoded video into an animated image that fits a byte budget: frame
//! sampling, the bounded binary search, and the staged fallback orchestrator.
//! Concrete encoders plug in through the [`EncodeOracle`] trait.

pub mod config;
pub mod oracle;
pub mod orchestrator;
pub mod sampler;
pub mod search;
pub mod sequence;

pub use config::{SearchConfig, Timing};
pub use oracle::{EncodeError, EncodeOracle};
pub use orchestrator::{Fit, SearchOutcome, Stage, StageOrchestrator, TrialRecord};
pub use sampler::{select, select_indices};
pub use search::{bounded_search, SearchHit, SearchSpace, SizeTargetRange};
pub use sequence::FrameSequence;

/// Result type for vidweb-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for vidweb-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Frame sequence is empty")]
    EmptyInput,

    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not produce any output after all stages: {0}")]
    ProductionFailure(EncodeError),
}

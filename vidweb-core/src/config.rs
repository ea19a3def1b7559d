//! Search configuration

use crate::{Error, Result, SizeTargetRange};

/// How each trial derives its output frame rate
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Timing {
    /// Spread the selected frames over the source duration
    Preserve,
    /// Play the selected frames at a fixed rate, changing the apparent duration
    Fixed(f64),
}

/// Parameters consumed by the stage orchestrator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Highest encoder quality tried (1-100)
    pub quality_ceiling: u8,
    /// Maximum number of frames handed to the encoder
    pub max_frame_cap: u32,
    /// Acceptable output size window
    pub size_target: SizeTargetRange,
    pub timing: Timing,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quality_ceiling: 80,
            max_frame_cap: 30,
            size_target: SizeTargetRange::from_cap_kib(490, 100),
            timing: Timing::Preserve,
        }
    }
}

impl SearchConfig {
    /// Checks every field is within its allowed range
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality_ceiling) {
            return Err(Error::InvalidConfig(format!(
                "quality must be between 1 and 100, got {}",
                self.quality_ceiling
            )));
        }
        if self.max_frame_cap == 0 {
            return Err(Error::InvalidConfig(
                "frame cap must be at least 1".to_string(),
            ));
        }
        if !self.size_target.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "size window must satisfy min < max, got {}..{}",
                self.size_target.min, self.size_target.max
            )));
        }
        if let Timing::Fixed(fps) = self.timing {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "fixed frame rate must be positive, got {fps}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.size_target.max, 490 * 1024);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut config = SearchConfig {
            quality_ceiling: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.quality_ceiling = 101;
        assert!(config.validate().is_err());

        config.quality_ceiling = 50;
        config.max_frame_cap = 0;
        assert!(config.validate().is_err());

        config.max_frame_cap = 10;
        config.size_target = SizeTargetRange::new(100, 100);
        assert!(config.validate().is_err());

        config.size_target = SizeTargetRange::new(10, 100);
        config.timing = Timing::Fixed(0.0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}

//! Soak run configuration.
//!
//! Values come from an optional JSON file, then command line overrides.

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::error::SoakError;

/// Largest payload a frame may carry, in 64-bit words.
pub const MAX_PAYLOAD_LEN: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoakConfig {
    /// Values pushed by each producer
    pub iterations: u64,
    /// Producer threads (spin lock scenarios only)
    pub producers: usize,
    /// Consumer threads (spin lock scenarios only)
    pub consumers: usize,
    /// Frames per simulated audio callback
    pub block_size: u32,
    /// Simulated sample rate in Hz
    pub sample_rate: u32,
    /// Payload words per pushed value
    pub payload_len: usize,
    /// Sleep for one callback period between pushes
    pub pace: bool,
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            iterations: 100_000,
            producers: 2,
            consumers: 2,
            block_size: 256,
            sample_rate: 48_000,
            payload_len: 64,
            pace: false,
        }
    }
}

/// Command line overrides for [`SoakConfig`].
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Values pushed by each producer
    #[arg(long, global = true)]
    pub iterations: Option<u64>,

    /// Producer threads for spin lock scenarios
    #[arg(long, global = true)]
    pub producers: Option<usize>,

    /// Consumer threads for spin lock scenarios
    #[arg(long, global = true)]
    pub consumers: Option<usize>,

    /// Frames per simulated audio callback
    #[arg(long, global = true)]
    pub block_size: Option<u32>,

    /// Simulated sample rate in Hz
    #[arg(long, global = true)]
    pub sample_rate: Option<u32>,

    /// Payload words per pushed value
    #[arg(long, global = true)]
    pub payload_len: Option<usize>,

    /// Sleep for one callback period between pushes
    #[arg(long, global = true)]
    pub pace: bool,
}

impl SoakConfig {
    /// Load a configuration file, filling missing fields with defaults.
    pub fn from_file(path: &Path) -> Result<Self, SoakError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded soak configuration");
        Ok(config)
    }

    /// Resolve the configuration from an optional file and command line overrides.
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, SoakError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides on top of the current values.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(iterations) = overrides.iterations {
            self.iterations = iterations;
        }
        if let Some(producers) = overrides.producers {
            self.producers = producers;
        }
        if let Some(consumers) = overrides.consumers {
            self.consumers = consumers;
        }
        if let Some(block_size) = overrides.block_size {
            self.block_size = block_size;
        }
        if let Some(sample_rate) = overrides.sample_rate {
            self.sample_rate = sample_rate;
        }
        if let Some(payload_len) = overrides.payload_len {
            self.payload_len = payload_len;
        }
        self.pace |= overrides.pace;
    }

    /// Reject configurations a run cannot honor.
    pub fn validate(&self) -> Result<(), SoakError> {
        let zero = [
            ("iterations", self.iterations == 0),
            ("producers", self.producers == 0),
            ("consumers", self.consumers == 0),
            ("block_size", self.block_size == 0),
            ("sample_rate", self.sample_rate == 0),
            ("payload_len", self.payload_len == 0),
        ];
        if let Some((field, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(SoakError::InvalidConfig(format!("{field} must be at least 1")));
        }
        if self.payload_len > MAX_PAYLOAD_LEN {
            return Err(SoakError::InvalidConfig(format!(
                "payload_len {} exceeds the maximum of {MAX_PAYLOAD_LEN}",
                self.payload_len
            )));
        }
        Ok(())
    }

    /// Duration of one simulated audio callback.
    pub fn callback_period(&self) -> Duration {
        let nanos = u64::from(self.block_size).saturating_mul(1_000_000_000);
        Duration::from_nanos(nanos / u64::from(self.sample_rate.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_default_is_valid() -> TestResult {
        SoakConfig::default().validate()?;
        Ok(())
    }

    #[test]
    fn test_zero_counts_are_rejected() {
        let config = SoakConfig {
            consumers: 0,
            ..SoakConfig::default()
        };
        match config.validate() {
            Err(SoakError::InvalidConfig(msg)) => assert!(msg.contains("consumers")),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let config = SoakConfig {
            payload_len: MAX_PAYLOAD_LEN + 1,
            ..SoakConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SoakError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overrides_win_over_file() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{ "iterations": 10, "payload_len": 8 }}"#)?;

        let overrides = ConfigOverrides {
            iterations: Some(20),
            ..ConfigOverrides::default()
        };
        let config = SoakConfig::resolve(Some(file.path()), &overrides)?;
        assert_eq!(config.iterations, 20);
        assert_eq!(config.payload_len, 8);
        assert_eq!(config.block_size, 256);
        Ok(())
    }

    #[test]
    fn test_unknown_fields_are_rejected() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{ "iterations": 10, "buffer": 8 }}"#)?;
        assert!(matches!(
            SoakConfig::from_file(file.path()),
            Err(SoakError::JsonError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_callback_period() {
        let config = SoakConfig {
            block_size: 480,
            sample_rate: 48_000,
            ..SoakConfig::default()
        };
        assert_eq!(config.callback_period(), Duration::from_millis(10));
    }
}

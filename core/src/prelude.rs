use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound on retained samples; keeps capacity arithmetic clear of overflow.
pub const MAX_CAPACITY: usize = u32::MAX as usize;

/// Construction-time parameters of a signal generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub sample_rate: f64,
    pub frequency: f64,
    pub history_seconds: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 100.0,
            frequency: 10.0,
            history_seconds: 300.0,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> SignalResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(SignalError::InvalidConfig(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if !self.history_seconds.is_finite() || self.history_seconds <= 0.0 {
            return Err(SignalError::InvalidConfig(format!(
                "history_seconds must be positive, got {}",
                self.history_seconds
            )));
        }
        let retained = (self.sample_rate * self.history_seconds).floor();
        if !retained.is_finite() || retained >= MAX_CAPACITY as f64 {
            return Err(SignalError::InvalidConfig(format!(
                "history of {} s at {} samples/s exceeds {} samples",
                self.history_seconds, self.sample_rate, MAX_CAPACITY
            )));
        }
        Ok(())
    }

    /// Number of retained samples: whole samples within the history span, never below one.
    pub fn capacity(&self) -> usize {
        ((self.sample_rate * self.history_seconds).floor() as usize).max(1)
    }

    /// Number of samples covering `seconds` of signal at this rate.
    pub fn samples_for(&self, seconds: f64) -> usize {
        samples_for(self.sample_rate, seconds)
    }
}

pub(crate) fn samples_for(sample_rate: f64, seconds: f64) -> usize {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (sample_rate * seconds).round() as usize
}

/// Owned copy of a suffix of the generator history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleWindow {
    pub timestamps: Vec<f64>,
    pub samples: Vec<f64>,
}

impl SampleWindow {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Common error type for generation, analysis and persistence.
#[derive(thiserror::Error, Debug)]
pub enum SignalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("empty input: {0}")]
    EmptyInput(String),
    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Format(String),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SignalError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SignalError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type SignalResult<T> = Result<T, SignalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_covers_five_minutes() {
        let config = GeneratorConfig::default();
        assert_eq!(config.capacity(), 100 * 300);
    }

    #[test]
    fn validate_rejects_non_positive_rate() {
        let config = GeneratorConfig {
            sample_rate: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SignalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn capacity_never_rounds_above_history_span() {
        let config = GeneratorConfig {
            sample_rate: 100.003,
            ..Default::default()
        };
        assert_eq!(config.capacity(), 30_000);
        assert!(config.capacity() as f64 <= config.sample_rate * config.history_seconds);
    }

    #[test]
    fn validate_rejects_oversized_history() {
        let config = GeneratorConfig {
            history_seconds: 1e30,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SignalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn samples_for_ignores_negative_durations() {
        let config = GeneratorConfig::default();
        assert_eq!(config.samples_for(3.0), 300);
        assert_eq!(config.samples_for(-1.0), 0);
    }
}

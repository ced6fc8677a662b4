//! Dominant frequency estimation from a one-sided magnitude spectrum.

use crate::math::fft::{rfft_frequencies, FftHelper};
use crate::math::stats::StatsHelper;
use crate::prelude::{SignalError, SignalResult};
use serde::{Deserialize, Serialize};

/// One bin of a one-sided magnitude spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumBin {
    pub frequency: f64,
    pub magnitude: f64,
}

/// Frequency of the strongest spectral bin of `samples`.
///
/// Ties resolve to the lowest frequency. Constant or all-zero input yields 0 Hz.
pub fn estimate_frequency(samples: &[f64], sample_rate: f64) -> SignalResult<f64> {
    FrequencyEstimator::new().estimate(samples, sample_rate)
}

/// Estimator that keeps its FFT plan while the input length is unchanged.
#[derive(Default)]
pub struct FrequencyEstimator {
    fft: Option<FftHelper>,
}

impl FrequencyEstimator {
    pub fn new() -> Self {
        Self { fft: None }
    }

    pub fn spectrum(&mut self, samples: &[f64], sample_rate: f64) -> SignalResult<Vec<SpectrumBin>> {
        if samples.is_empty() {
            return Err(SignalError::EmptyInput(
                "frequency estimation needs at least one sample".into(),
            ));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(SignalError::InvalidConfig(format!(
                "sample_rate must be positive, got {}",
                sample_rate
            )));
        }

        let fft = match self.fft.take() {
            Some(helper) if helper.len() == samples.len() => self.fft.insert(helper),
            _ => self.fft.insert(FftHelper::new(samples.len())),
        };

        let magnitudes = fft.one_sided_magnitudes(samples);
        let frequencies = rfft_frequencies(samples.len(), sample_rate);
        Ok(frequencies
            .into_iter()
            .zip(magnitudes)
            .map(|(frequency, magnitude)| SpectrumBin {
                frequency,
                magnitude,
            })
            .collect())
    }

    pub fn estimate(&mut self, samples: &[f64], sample_rate: f64) -> SignalResult<f64> {
        let spectrum = self.spectrum(samples, sample_rate)?;
        let magnitudes: Vec<f64> = spectrum.iter().map(|bin| bin.magnitude).collect();
        let peak = StatsHelper::argmax(&magnitudes).unwrap_or(0);
        Ok(spectrum[peak].frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(frequency: f64, sample_rate: f64, count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| (2.0 * PI * frequency * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn estimates_pure_sine_within_one_bin() {
        let samples = sine(10.0, 100.0, 1000);
        let estimate = estimate_frequency(&samples, 100.0).unwrap();
        assert!((estimate - 10.0).abs() <= 100.0 / 1000.0);
    }

    #[test]
    fn estimates_off_bin_frequency_within_resolution() {
        let samples = sine(7.3, 64.0, 256);
        let estimate = estimate_frequency(&samples, 64.0).unwrap();
        assert!((estimate - 7.3).abs() <= 64.0 / 256.0);
    }

    #[test]
    fn all_zero_input_reports_zero_hz() {
        assert_eq!(estimate_frequency(&[0.0; 64], 100.0).unwrap(), 0.0);
    }

    #[test]
    fn single_sample_reports_zero_hz() {
        assert_eq!(estimate_frequency(&[0.7], 100.0).unwrap(), 0.0);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            estimate_frequency(&[], 100.0),
            Err(SignalError::EmptyInput(_))
        ));
    }

    #[test]
    fn estimator_replans_when_length_changes() {
        let mut estimator = FrequencyEstimator::new();
        let short = sine(5.0, 50.0, 100);
        let long = sine(12.0, 50.0, 500);
        assert!((estimator.estimate(&short, 50.0).unwrap() - 5.0).abs() <= 0.5);
        assert!((estimator.estimate(&long, 50.0).unwrap() - 12.0).abs() <= 0.1);
        assert_eq!(estimator.spectrum(&long, 50.0).unwrap().len(), 251);
    }
}

use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse across calls of one length.
pub struct FftHelper {
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::zero(); fft.get_inplace_scratch_len()];
        Self { fft, scratch }
    }

    pub fn len(&self) -> usize {
        self.fft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fft.len() == 0
    }

    /// Forward transform of a real sequence, zero-padded or truncated to the plan length.
    pub fn forward(&mut self, input: &[f64]) -> Vec<Complex64> {
        let size = self.len();
        let mut buffer: Vec<Complex64> = input
            .iter()
            .take(size)
            .map(|&value| Complex64::new(value, 0.0))
            .collect();
        buffer.resize(size, Complex64::zero());

        self.fft.process_with_scratch(&mut buffer, &mut self.scratch);
        buffer
    }

    /// Magnitudes of the non-negative frequency bins `0..=n/2`.
    pub fn one_sided_magnitudes(&mut self, input: &[f64]) -> Vec<f64> {
        let bins = self.len() / 2 + 1;
        self.forward(input)
            .iter()
            .take(bins)
            .map(|c| c.norm())
            .collect()
    }
}

/// Bin centre frequencies of a one-sided spectrum of `n` real samples.
pub fn rfft_frequencies(n: usize, sample_rate: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let spacing = sample_rate / n as f64;
    (0..=n / 2).map(|k| k as f64 * spacing).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft_helper_returns_same_length() {
        let mut helper = FftHelper::new(4);
        let output = helper.forward(&[1.0, 0.0, -1.0, 0.0]);
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn one_sided_spectrum_has_half_plus_one_bins() {
        let mut helper = FftHelper::new(8);
        assert_eq!(helper.one_sided_magnitudes(&[0.0; 8]).len(), 5);
        let mut odd = FftHelper::new(7);
        assert_eq!(odd.one_sided_magnitudes(&[0.0; 7]).len(), 4);
    }

    #[test]
    fn dc_input_concentrates_in_bin_zero() {
        let mut helper = FftHelper::new(4);
        let magnitudes = helper.one_sided_magnitudes(&[1.0, 1.0, 1.0, 1.0]);
        assert!((magnitudes[0] - 4.0).abs() < 1e-12);
        assert!(magnitudes[1..].iter().all(|m| m.abs() < 1e-12));
    }

    #[test]
    fn rfft_frequencies_match_numpy_layout() {
        assert_eq!(rfft_frequencies(4, 100.0), vec![0.0, 25.0, 50.0]);
        assert_eq!(rfft_frequencies(5, 10.0), vec![0.0, 2.0, 4.0]);
        assert!(rfft_frequencies(0, 10.0).is_empty());
    }
}

use crate::generator::history::SampleHistory;
use crate::prelude::{GeneratorConfig, SampleWindow, SignalResult};
use std::collections::VecDeque;
use std::f64::consts::PI;

/// Sine source producing one sample per tick into a capped history.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    frequency: f64,
    sample_rate: f64,
    ticks: u64,
    history: SampleHistory,
}

impl SignalGenerator {
    pub fn new(config: &GeneratorConfig) -> SignalResult<Self> {
        config.validate()?;
        Ok(Self {
            frequency: config.frequency,
            sample_rate: config.sample_rate,
            ticks: 0,
            history: SampleHistory::with_capacity(config.capacity()),
        })
    }

    /// Any value is accepted; zero gives a flat line, negative a flipped wave.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    pub fn tick(&mut self) -> f64 {
        let time = self.time_cursor();
        let value = (2.0 * PI * self.frequency * time).sin();
        self.history.push(time, value);
        self.ticks += 1;
        value
    }

    /// Clears retained samples; the time cursor keeps running.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Time of the next sample. Derived from the tick count so it never drifts.
    pub fn time_cursor(&self) -> f64 {
        self.ticks as f64 / self.sample_rate
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn capacity(&self) -> usize {
        self.history.capacity()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn samples(&self) -> &VecDeque<f64> {
        self.history.samples()
    }

    pub fn timestamps(&self) -> &VecDeque<f64> {
        self.history.timestamps()
    }

    pub fn latest(&self, count: usize) -> SampleWindow {
        self.history.suffix(count)
    }

    pub fn history(&self) -> SampleWindow {
        self.history.to_window()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(sample_rate: f64, frequency: f64, history_seconds: f64) -> SignalGenerator {
        SignalGenerator::new(&GeneratorConfig {
            sample_rate,
            frequency,
            history_seconds,
        })
        .unwrap()
    }

    #[test]
    fn ticks_follow_sine_of_elapsed_time() {
        let mut gen = generator(100.0, 10.0, 300.0);
        for _ in 0..1000 {
            gen.tick();
        }
        assert_eq!(gen.samples()[0], 0.0);
        assert!(gen.samples()[25].abs() < 1e-9);
        for (i, &value) in gen.samples().iter().enumerate() {
            let expected = (2.0 * PI * 10.0 * i as f64 / 100.0).sin();
            assert!((value - expected).abs() < 1e-9, "sample {i}");
        }
        assert!((gen.time_cursor() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn history_never_exceeds_capacity() {
        let mut gen = generator(10.0, 1.0, 2.0);
        assert_eq!(gen.capacity(), 20);
        for _ in 0..55 {
            gen.tick();
            assert_eq!(gen.samples().len(), gen.timestamps().len());
            assert!(gen.len() <= 20);
        }
        assert_eq!(gen.len(), 20);
    }

    #[test]
    fn fractional_rate_keeps_length_within_span() {
        let mut gen = generator(100.003, 1.0, 300.0);
        for _ in 0..31_000 {
            gen.tick();
        }
        assert_eq!(gen.len(), 30_000);
        assert!(gen.len() as f64 <= 100.003 * 300.0);
    }

    #[test]
    fn oversized_history_is_rejected() {
        let config = GeneratorConfig {
            sample_rate: 100.0,
            frequency: 1.0,
            history_seconds: 1e30,
        };
        assert!(SignalGenerator::new(&config).is_err());
    }

    #[test]
    fn eviction_is_fifo_one_pair_per_tick() {
        let mut gen = generator(10.0, 1.0, 1.0);
        for _ in 0..10 {
            gen.tick();
        }
        let before = gen.history();
        gen.tick();
        let after = gen.history();
        assert_eq!(&after.timestamps[..9], &before.timestamps[1..]);
        assert_eq!(&after.samples[..9], &before.samples[1..]);
        assert!((after.timestamps[9] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn frequency_change_applies_to_next_sample() {
        let mut gen = generator(8.0, 0.0, 10.0);
        assert_eq!(gen.tick(), 0.0);
        assert_eq!(gen.tick(), 0.0);
        gen.set_frequency(1.0);
        let expected = (2.0 * PI * 1.0 * 2.0 / 8.0).sin();
        assert!((gen.tick() - expected).abs() < 1e-12);
    }

    #[test]
    fn negative_frequency_flips_the_wave() {
        let mut up = generator(100.0, 5.0, 1.0);
        let mut down = generator(100.0, -5.0, 1.0);
        for _ in 0..20 {
            assert!((up.tick() + down.tick()).abs() < 1e-12);
        }
    }

    #[test]
    fn reset_clears_history_but_keeps_time() {
        let mut gen = generator(10.0, 1.0, 10.0);
        for _ in 0..5 {
            gen.tick();
        }
        gen.reset();
        assert!(gen.is_empty());
        gen.tick();
        assert!((gen.timestamps()[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn latest_returns_recent_suffix() {
        let mut gen = generator(10.0, 1.0, 10.0);
        for _ in 0..30 {
            gen.tick();
        }
        let window = gen.latest(10);
        assert_eq!(window.len(), 10);
        assert!((window.timestamps[0] - 2.0).abs() < 1e-12);
    }
}

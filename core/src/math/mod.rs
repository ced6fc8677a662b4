pub mod fft;
pub mod stats;

pub use fft::{rfft_frequencies, FftHelper};
pub use stats::StatsHelper;

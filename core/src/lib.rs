//! Core of the real-time sine wave platform.
//!
//! A capped-history sine generator, an FFT-based dominant frequency
//! estimator, snapshot persistence and a single periodic dispatcher that
//! orders generation, plotting and saving on one timeline.

pub mod analysis;
pub mod generator;
pub mod math;
pub mod prelude;
pub mod schedule;
pub mod session;
pub mod snapshot;
pub mod telemetry;

pub use analysis::{estimate_frequency, FrequencyEstimator};
pub use generator::SignalGenerator;
pub use prelude::{GeneratorConfig, SampleWindow, SignalError, SignalResult};
pub use session::{Session, SessionConfig, TickReport};

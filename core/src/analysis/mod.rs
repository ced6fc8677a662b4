pub mod estimator;

pub use estimator::{estimate_frequency, FrequencyEstimator, SpectrumBin};

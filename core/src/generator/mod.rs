pub mod history;
pub mod sine;

pub use history::SampleHistory;
pub use sine::SignalGenerator;

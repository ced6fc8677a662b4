use serde::{Deserialize, Serialize};
use sinecore::session::Session;
use sinecore::telemetry::Metrics;
use sinecore::SampleWindow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusModel {
    pub running: bool,
    pub frequency: f64,
    pub sample_rate: f64,
    pub retained: usize,
    pub capacity: usize,
    pub time_cursor: f64,
    pub ticks: u64,
    pub snapshots: u64,
    pub errors: u64,
}

impl StatusModel {
    pub fn capture(session: &Session, metrics: Metrics) -> Self {
        let generator = session.generator();
        Self {
            running: session.is_running(),
            frequency: generator.frequency(),
            sample_rate: generator.sample_rate(),
            retained: generator.len(),
            capacity: generator.capacity(),
            time_cursor: generator.time_cursor(),
            ticks: metrics.ticks,
            snapshots: metrics.snapshots,
            errors: metrics.errors,
        }
    }
}

/// Plot feed: a time-stamped window of recent samples.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowModel {
    pub frequency: f64,
    pub timestamps: Vec<f64>,
    pub samples: Vec<f64>,
}

impl WindowModel {
    pub fn new(frequency: f64, window: SampleWindow) -> Self {
        Self {
            frequency,
            timestamps: window.timestamps,
            samples: window.samples,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrequencyRequest {
    pub frequency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimateModel {
    pub frequency: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlReply {
    pub status: String,
    pub running: bool,
}

impl ControlReply {
    pub fn ok(running: bool) -> Self {
        Self {
            status: "ok".into(),
            running,
        }
    }
}

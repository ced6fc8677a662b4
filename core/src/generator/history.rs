use crate::prelude::SampleWindow;
use std::collections::VecDeque;

const PREALLOCATE_LIMIT: usize = 1 << 16;

/// Capped pair of parallel sequences that prevents unbounded growth.
///
/// Once full, each push drops the oldest timestamp/sample pair.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    timestamps: VecDeque<f64>,
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        // large histories grow on demand
        let reserve = capacity.saturating_add(1).min(PREALLOCATE_LIMIT);
        Self {
            timestamps: VecDeque::with_capacity(reserve),
            samples: VecDeque::with_capacity(reserve),
            capacity,
        }
    }

    /// Appends one pair, evicting the oldest when over capacity.
    /// Returns true when an eviction happened.
    pub fn push(&mut self, timestamp: f64, sample: f64) -> bool {
        self.timestamps.push_back(timestamp);
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.timestamps.pop_front();
            self.samples.pop_front();
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples(&self) -> &VecDeque<f64> {
        &self.samples
    }

    pub fn timestamps(&self) -> &VecDeque<f64> {
        &self.timestamps
    }

    /// Copies the most recent `count` pairs (fewer if not yet retained).
    pub fn suffix(&self, count: usize) -> SampleWindow {
        let skip = self.len().saturating_sub(count);
        SampleWindow {
            timestamps: self.timestamps.iter().skip(skip).copied().collect(),
            samples: self.samples.iter().skip(skip).copied().collect(),
        }
    }

    pub fn to_window(&self) -> SampleWindow {
        self.suffix(self.len())
    }
}

//! Single periodic dispatcher for generation, plotting and snapshot saves.
//!
//! All tasks run on one logical millisecond timeline. Firings that fall due
//! together are ordered by due time first, then by [`TaskKind`] priority, so
//! a save at time `t` always sees the sample generated at `t`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Generate,
    Plot,
    SaveRecent,
    SaveAll,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Generate,
        TaskKind::Plot,
        TaskKind::SaveRecent,
        TaskKind::SaveAll,
    ];
}

/// One due task; orders by due time, then task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Firing {
    pub due_ms: u64,
    pub kind: TaskKind,
}

/// Task periods in milliseconds. Zero disables a task; generation is never disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Defaults to the whole milliseconds between samples at the sample rate.
    pub generate_ms: Option<u64>,
    pub plot_ms: u64,
    pub save_recent_ms: u64,
    pub save_all_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            generate_ms: None,
            plot_ms: 100,
            save_recent_ms: 1_000,
            save_all_ms: 300_000,
        }
    }
}

impl ScheduleConfig {
    pub fn generate_interval_ms(&self, sample_rate: f64) -> u64 {
        self.generate_ms
            .unwrap_or_else(|| (1000.0 / sample_rate).floor() as u64)
            .max(1)
    }

    fn period_ms(&self, kind: TaskKind, sample_rate: f64) -> u64 {
        match kind {
            TaskKind::Generate => self.generate_interval_ms(sample_rate),
            TaskKind::Plot => self.plot_ms,
            TaskKind::SaveRecent => self.save_recent_ms,
            TaskKind::SaveAll => self.save_all_ms,
        }
    }
}

#[derive(Debug, Clone)]
struct TaskSlot {
    kind: TaskKind,
    period_ms: u64,
    next_due_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    slots: Vec<TaskSlot>,
    now_ms: u64,
}

impl Dispatcher {
    pub fn new(config: &ScheduleConfig, sample_rate: f64) -> Self {
        let slots = TaskKind::ALL
            .iter()
            .map(|&kind| (kind, config.period_ms(kind, sample_rate)))
            .filter(|&(_, period_ms)| period_ms > 0)
            .map(|(kind, period_ms)| TaskSlot {
                kind,
                period_ms,
                next_due_ms: period_ms,
            })
            .collect();
        Self { slots, now_ms: 0 }
    }

    /// Rewinds the timeline; each task first fires one period from now.
    pub fn reset(&mut self) {
        self.now_ms = 0;
        for slot in &mut self.slots {
            slot.next_due_ms = slot.period_ms;
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn period_ms(&self, kind: TaskKind) -> Option<u64> {
        self.slots
            .iter()
            .find(|slot| slot.kind == kind)
            .map(|slot| slot.period_ms)
    }

    /// Greatest common divisor of the enabled periods.
    pub fn resolution_ms(&self) -> u64 {
        self.slots
            .iter()
            .map(|slot| slot.period_ms)
            .fold(0, gcd)
            .max(1)
    }

    /// Returns every firing due in `(previous now, now_ms]`, in execution order.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<Firing> {
        if now_ms <= self.now_ms {
            return Vec::new();
        }

        let mut firings = Vec::new();
        for slot in &mut self.slots {
            while slot.next_due_ms <= now_ms {
                firings.push(Firing {
                    due_ms: slot.next_due_ms,
                    kind: slot.kind,
                });
                slot.next_due_ms += slot.period_ms;
            }
        }
        firings.sort_unstable();
        self.now_ms = now_ms;
        firings
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

//! Running/stopped state and the wiring between dispatcher, generator and writer.

use crate::analysis::FrequencyEstimator;
use crate::generator::SignalGenerator;
use crate::prelude::{samples_for, GeneratorConfig, SampleWindow, SignalError, SignalResult};
use crate::schedule::{Dispatcher, ScheduleConfig, TaskKind};
use crate::snapshot::{SnapshotContext, SnapshotFormat, SnapshotKind, SnapshotWriter};
use crate::telemetry::log::LogManager;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub generator: GeneratorConfig,
    pub schedule: ScheduleConfig,
    pub data_dir: PathBuf,
    pub format: SnapshotFormat,
    pub plot_window_seconds: f64,
    pub recent_window_seconds: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            schedule: ScheduleConfig::default(),
            data_dir: PathBuf::from("data"),
            format: SnapshotFormat::Npy,
            plot_window_seconds: 3.0,
            recent_window_seconds: 1.0,
        }
    }
}

/// Outcome of one `advance_to` call.
#[derive(Debug, Default)]
pub struct TickReport {
    pub generated: usize,
    pub plotted: bool,
    pub snapshots: Vec<PathBuf>,
    pub failures: Vec<SignalError>,
}

pub struct Session {
    config: SessionConfig,
    generator: SignalGenerator,
    dispatcher: Dispatcher,
    writer: SnapshotWriter,
    estimator: FrequencyEstimator,
    running: bool,
    wall_start: Option<NaiveDateTime>,
    plot: SampleWindow,
    logger: LogManager,
}

impl Session {
    pub fn new(config: SessionConfig) -> SignalResult<Self> {
        let generator = SignalGenerator::new(&config.generator)?;
        let dispatcher = Dispatcher::new(&config.schedule, config.generator.sample_rate);
        let writer = SnapshotWriter::new(config.data_dir.clone(), config.format);
        Ok(Self {
            config,
            generator,
            dispatcher,
            writer,
            estimator: FrequencyEstimator::new(),
            running: false,
            wall_start: None,
            plot: SampleWindow::default(),
            logger: LogManager::new(),
        })
    }

    /// Clears the history and restarts the task timeline at `wall_start`.
    pub fn start(&mut self, wall_start: NaiveDateTime) {
        self.generator.reset();
        self.dispatcher.reset();
        self.plot = SampleWindow::default();
        self.wall_start = Some(wall_start);
        self.running = true;
        self.logger.record(&format!(
            "generation started at {:.1} Hz, {} samples/s",
            self.generator.frequency(),
            self.generator.sample_rate()
        ));
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.logger.record(&format!(
                "generation stopped with {} samples retained",
                self.generator.len()
            ));
        }
    }

    /// Flips between running and stopped; returns the new state.
    pub fn toggle(&mut self, wall: NaiveDateTime) -> bool {
        if self.running {
            self.stop();
        } else {
            self.start(wall);
        }
        self.running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_frequency(&mut self, frequency: f64) {
        self.generator.set_frequency(frequency);
        self.logger.record(&format!("frequency: {} Hz", frequency));
    }

    pub fn generator(&self) -> &SignalGenerator {
        &self.generator
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Milliseconds of the task timeline since the last start.
    pub fn elapsed_ms(&self) -> u64 {
        self.dispatcher.now_ms()
    }

    pub fn resolution_ms(&self) -> u64 {
        self.dispatcher.resolution_ms()
    }

    /// Runs every task due up to `now_ms`. Does nothing while stopped.
    pub fn advance_to(&mut self, now_ms: u64) -> TickReport {
        let mut report = TickReport::default();
        if !self.running {
            return report;
        }

        for firing in self.dispatcher.advance_to(now_ms) {
            match firing.kind {
                TaskKind::Generate => {
                    self.generator.tick();
                    report.generated += 1;
                }
                TaskKind::Plot => {
                    self.plot = self.window(self.config.plot_window_seconds);
                    report.plotted = true;
                }
                TaskKind::SaveRecent | TaskKind::SaveAll => {
                    match self.save(firing.kind, firing.due_ms) {
                        Ok(path) => report.snapshots.push(path),
                        Err(err) => {
                            self.logger.warn(&format!("snapshot failed: {}", err));
                            report.failures.push(err);
                        }
                    }
                }
            }
        }
        report
    }

    /// File names are stamped with the firing's due time, not the batch end.
    fn save(&self, task: TaskKind, due_ms: u64) -> SignalResult<PathBuf> {
        let (kind, window) = if task == TaskKind::SaveAll {
            (SnapshotKind::All, self.generator.history())
        } else {
            (
                SnapshotKind::Recent,
                self.window(self.config.recent_window_seconds),
            )
        };
        let wall_start = self
            .wall_start
            .ok_or_else(|| SignalError::InvalidConfig("session was never started".into()))?;
        let wall = wall_start + Duration::milliseconds(due_ms as i64);
        let context = SnapshotContext {
            sample_rate: self.generator.sample_rate(),
            frequency: self.generator.frequency(),
        };
        self.writer.save(kind, &window, context, wall)
    }

    /// Window most recently prepared for plotting.
    pub fn plot_window(&self) -> SampleWindow {
        self.plot.clone()
    }

    /// Copy of the last `seconds` of history.
    pub fn window(&self, seconds: f64) -> SampleWindow {
        self.generator
            .latest(samples_for(self.generator.sample_rate(), seconds))
    }

    /// Dominant frequency of the retained history.
    pub fn estimate(&mut self) -> SignalResult<f64> {
        let history = self.generator.history();
        self.estimator
            .estimate(&history.samples, self.generator.sample_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::load_snapshot;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn wall() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|date| date.and_hms_opt(3, 4, 5))
            .unwrap()
    }

    fn session(dir: &TempDir) -> Session {
        Session::new(SessionConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn stopped_session_ignores_time() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        let report = session.advance_to(5_000);
        assert_eq!(report.generated, 0);
        assert!(session.generator().is_empty());
    }

    #[test]
    fn one_second_generates_plots_and_saves() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.start(wall());
        let report = session.advance_to(1_000);
        assert_eq!(report.generated, 100);
        assert!(report.plotted);
        assert!(report.failures.is_empty());
        assert_eq!(report.snapshots.len(), 1);
        assert_eq!(
            report.snapshots[0],
            dir.path().join("sinewave_data_20240102-030406.npy")
        );
        let saved = load_snapshot(&report.snapshots[0]).unwrap();
        assert_eq!(saved.len(), 100);
        assert_eq!(saved, session.generator().history().samples);
        assert_eq!(session.plot_window().len(), 100);
    }

    #[test]
    fn catch_up_batch_saves_to_distinct_files() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.start(wall());
        let report = session.advance_to(3_000);
        assert_eq!(report.snapshots.len(), 3);
        assert_eq!(
            report.snapshots,
            vec![
                dir.path().join("sinewave_data_20240102-030406.npy"),
                dir.path().join("sinewave_data_20240102-030407.npy"),
                dir.path().join("sinewave_data_20240102-030408.npy"),
            ]
        );
        assert_eq!(load_snapshot(&report.snapshots[0]).unwrap().len(), 100);
    }

    #[test]
    fn plot_window_is_capped_at_three_seconds() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.start(wall());
        session.advance_to(10_000);
        let plot = session.plot_window();
        assert_eq!(plot.len(), 300);
        assert!((plot.timestamps[0] - 7.0).abs() < 1e-9);
    }

    #[test]
    fn restart_clears_history_and_keeps_time_cursor() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.start(wall());
        session.advance_to(500);
        assert_eq!(session.generator().len(), 50);
        assert!(!session.toggle(wall()));
        assert!(session.toggle(wall()));
        assert!(session.generator().is_empty());
        session.advance_to(10);
        assert!((session.generator().timestamps()[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn estimate_tracks_frequency_changes() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.set_frequency(20.0);
        session.start(wall());
        session.advance_to(10_000);
        let estimate = session.estimate().unwrap();
        assert!((estimate - 20.0).abs() <= 0.1);
    }

    #[test]
    fn snapshot_failures_are_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let mut session = Session::new(SessionConfig {
            data_dir: blocker.join("data"),
            ..Default::default()
        })
        .unwrap();
        session.start(wall());
        let report = session.advance_to(2_000);
        assert_eq!(report.generated, 200);
        assert_eq!(report.failures.len(), 2);
        assert!(report.snapshots.is_empty());
    }

    #[test]
    fn empty_history_cannot_be_estimated() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        assert!(matches!(session.estimate(), Err(SignalError::EmptyInput(_))));
    }
}

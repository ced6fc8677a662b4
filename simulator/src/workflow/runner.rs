use crate::control_bridge::bridge::Bridge;
use crate::workflow::config::WorkflowConfig;
use anyhow::{anyhow, bail, Context};
use chrono::Local;
use log::{info, warn};
use sinecore::session::{Session, TickReport};
use sinecore::telemetry::MetricsRecorder;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Session shared by the real-time loop and the HTTP bridge.
pub type SharedSession = Arc<Mutex<Session>>;

pub fn lock_session(session: &SharedSession) -> anyhow::Result<MutexGuard<'_, Session>> {
    session
        .lock()
        .map_err(|_| anyhow!("session lock poisoned"))
}

/// Run length as a `Duration`; rejects NaN, infinite and negative spans.
pub fn run_length(seconds: f64) -> anyhow::Result<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("run length must be a finite, non-negative number of seconds, got {}", seconds);
    }
    Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("run length of {} seconds is out of range", seconds))
}

pub struct OfflineSummary {
    pub generated: u64,
    pub retained: usize,
    pub frequency: f64,
    pub estimated_frequency: Option<f64>,
    pub snapshots: Vec<PathBuf>,
    pub failures: usize,
}

pub struct RealtimeOptions {
    pub serve: bool,
    pub paused: bool,
    pub seconds: Option<f64>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    #[cfg(test)]
    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    pub fn build_session(&self) -> anyhow::Result<Session> {
        Session::new(self.config.to_session_config()).context("building generator session")
    }

    /// Replays `seconds` of logical time without waiting on the wall clock.
    pub fn run_offline(&self, seconds: f64) -> anyhow::Result<OfflineSummary> {
        let length = run_length(seconds)?;
        let mut session = self.build_session()?;
        session.start(Local::now().naive_local());

        let end_ms = u64::try_from(length.as_millis()).context("run length overflows milliseconds")?;
        let step_ms = session.resolution_ms();
        let mut now_ms = 0;
        let mut snapshots = Vec::new();
        let mut failures = 0;

        while now_ms < end_ms {
            now_ms = (now_ms + step_ms).min(end_ms);
            let report = session.advance_to(now_ms);
            failures += report.failures.len();
            self.absorb(&report);
            snapshots.extend(report.snapshots);
        }
        session.stop();

        let estimated_frequency = match session.estimate() {
            Ok(frequency) => Some(frequency),
            Err(err) => {
                warn!("no frequency estimate: {}", err);
                None
            }
        };

        Ok(OfflineSummary {
            generated: session.generator().ticks(),
            retained: session.generator().len(),
            frequency: session.generator().frequency(),
            estimated_frequency,
            snapshots,
            failures,
        })
    }

    /// Drives the session from the wall clock until Ctrl+C or the optional deadline.
    pub async fn run_realtime(&self, options: RealtimeOptions) -> anyhow::Result<()> {
        let length = options.seconds.map(run_length).transpose()?;
        let session: SharedSession = Arc::new(Mutex::new(self.build_session()?));
        let resolution_ms = {
            let mut guard = lock_session(&session)?;
            if !options.paused {
                guard.start(Local::now().naive_local());
            }
            guard.resolution_ms()
        };

        if options.serve {
            let addr = Bridge::spawn(session.clone(), self.metrics.clone(), self.config.bind)?;
            info!("control bridge listening on http://{}", addr);
        }

        let mut interval = time::interval(Duration::from_millis(resolution_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        let deadline = async {
            match length {
                Some(length) => time::sleep(length).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut last = Instant::now();
        let mut carry = Duration::ZERO;
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                result = &mut shutdown => {
                    result.context("awaiting Ctrl+C to exit")?;
                    break;
                }
                _ = &mut deadline => break,
            }

            let now = Instant::now();
            carry += now - last;
            last = now;
            let step_ms = carry.as_millis() as u64;
            carry -= Duration::from_millis(step_ms);

            let report = {
                let mut guard = lock_session(&session)?;
                let target = guard.elapsed_ms() + step_ms;
                guard.advance_to(target)
            };
            self.absorb(&report);
        }

        let mut guard = lock_session(&session)?;
        guard.stop();
        let metrics = self.metrics.snapshot();
        info!(
            "real-time run finished: {} ticks, {} snapshots, {} errors",
            metrics.ticks, metrics.snapshots, metrics.errors
        );
        Ok(())
    }

    fn absorb(&self, report: &TickReport) {
        self.metrics.record_ticks(report.generated as u64);
        for _ in &report.snapshots {
            self.metrics.record_snapshot();
        }
        for err in &report.failures {
            warn!("snapshot error: {}", err);
            self.metrics.record_error();
        }
    }
}

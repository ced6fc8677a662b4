use anyhow::Context;
use serde::{Deserialize, Serialize};
use sinecore::prelude::GeneratorConfig;
use sinecore::schedule::ScheduleConfig;
use sinecore::session::SessionConfig;
use sinecore::snapshot::SnapshotFormat;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub sample_rate: f64,
    pub frequency: f64,
    pub history_seconds: f64,
    pub data_dir: PathBuf,
    pub format: SnapshotFormat,
    pub plot_window_seconds: f64,
    pub recent_window_seconds: f64,
    pub schedule: ScheduleConfig,
    pub bind: SocketAddr,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            sample_rate: session.generator.sample_rate,
            frequency: session.generator.frequency,
            history_seconds: session.generator.history_seconds,
            data_dir: session.data_dir,
            format: session.format,
            plot_window_seconds: session.plot_window_seconds,
            recent_window_seconds: session.recent_window_seconds,
            schedule: session.schedule,
            bind: default_bind(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .to_generator_config()
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        sample_rate: f64,
        frequency: f64,
        history_seconds: f64,
        data_dir: PathBuf,
        format: SnapshotFormat,
    ) -> Self {
        Self {
            sample_rate,
            frequency,
            history_seconds,
            data_dir,
            format,
            ..Default::default()
        }
    }

    pub fn to_generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            sample_rate: self.sample_rate,
            frequency: self.frequency,
            history_seconds: self.history_seconds,
        }
    }

    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            generator: self.to_generator_config(),
            schedule: self.schedule.clone(),
            data_dir: self.data_dir.clone(),
            format: self.format,
            plot_window_seconds: self.plot_window_seconds,
            recent_window_seconds: self.recent_window_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_session_config() {
        let cfg = WorkflowConfig::from_args(
            250.0,
            12.0,
            60.0,
            PathBuf::from("out"),
            SnapshotFormat::Json,
        );
        let session = cfg.to_session_config();
        assert_eq!(session.generator.capacity(), 15_000);
        assert_eq!(session.format, SnapshotFormat::Json);
        assert_eq!(session.plot_window_seconds, 3.0);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"sample_rate: 50\nfrequency: 4.5\nformat: json\nschedule:\n  save_all_ms: 0\nbind: 127.0.0.1:9100\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.sample_rate, 50.0);
        assert_eq!(cfg.frequency, 4.5);
        assert_eq!(cfg.format, SnapshotFormat::Json);
        assert_eq!(cfg.schedule.save_all_ms, 0);
        assert_eq!(cfg.schedule.plot_ms, 100);
        assert_eq!(cfg.history_seconds, 300.0);
        assert_eq!(cfg.bind.port(), 9100);
    }

    #[test]
    fn config_load_rejects_invalid_rate() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"sample_rate: -1\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}

use crate::prelude::{SampleWindow, SignalError, SignalResult};
use crate::snapshot::npy::{read_npy, write_npy};
use crate::telemetry::log::LogManager;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const FILE_PREFIX: &str = "sinewave_data";
const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// On-disk encoding of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Bare `<f8` array of the sample values.
    #[default]
    Npy,
    /// Self-describing record with timestamps and generator context.
    Json,
}

impl SnapshotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Npy => "npy",
            SnapshotFormat::Json => "json",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for SnapshotFormat {
    type Err = SignalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "npy" => Ok(SnapshotFormat::Npy),
            "json" => Ok(SnapshotFormat::Json),
            other => Err(SignalError::InvalidConfig(format!(
                "unknown snapshot format {}",
                other
            ))),
        }
    }
}

/// Which part of the history a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Recent,
    All,
}

impl SnapshotKind {
    fn file_stem(self, stamp: &str) -> String {
        match self {
            SnapshotKind::Recent => format!("{}_{}", FILE_PREFIX, stamp),
            SnapshotKind::All => format!("{}_all_{}", FILE_PREFIX, stamp),
        }
    }
}

/// Generator state recorded alongside the samples in JSON snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotContext {
    pub sample_rate: f64,
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub kind: SnapshotKind,
    pub sample_rate: f64,
    pub frequency: f64,
    pub timestamps: Vec<f64>,
    pub samples: Vec<f64>,
}

/// Writes one file per save event into a data directory.
///
/// Files are named after the wall-clock second of the save, so two saves of
/// the same kind within one second overwrite each other.
pub struct SnapshotWriter {
    dir: PathBuf,
    format: SnapshotFormat,
    logger: LogManager,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>, format: SnapshotFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            logger: LogManager::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }

    pub fn file_path(&self, kind: SnapshotKind, wall: NaiveDateTime) -> PathBuf {
        let stamp = wall.format(STAMP_FORMAT).to_string();
        self.dir
            .join(kind.file_stem(&stamp))
            .with_extension(self.format.extension())
    }

    pub fn save(
        &self,
        kind: SnapshotKind,
        window: &SampleWindow,
        context: SnapshotContext,
        wall: NaiveDateTime,
    ) -> SignalResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|err| SignalError::io(&self.dir, err))?;
        let path = self.file_path(kind, wall);
        let file = File::create(&path).map_err(|err| SignalError::io(&path, err))?;
        let mut out = BufWriter::new(file);

        match self.format {
            SnapshotFormat::Npy => {
                write_npy(&mut out, &window.samples).map_err(|err| SignalError::io(&path, err))?
            }
            SnapshotFormat::Json => {
                let record = SnapshotRecord {
                    kind,
                    sample_rate: context.sample_rate,
                    frequency: context.frequency,
                    timestamps: window.timestamps.clone(),
                    samples: window.samples.clone(),
                };
                serde_json::to_writer(&mut out, &record)?;
            }
        }
        out.flush().map_err(|err| SignalError::io(&path, err))?;

        self.logger.detail(&format!(
            "snapshot {:?} with {} samples -> {}",
            kind,
            window.len(),
            path.display()
        ));
        Ok(path)
    }
}

/// Loads the sample values of a snapshot, picking the decoder by extension.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> SignalResult<Vec<f64>> {
    let path = path.as_ref();
    let format = SnapshotFormat::from_path(path).ok_or_else(|| {
        SignalError::Format(format!("unrecognised snapshot extension: {}", path.display()))
    })?;
    let file = File::open(path).map_err(|err| SignalError::io(path, err))?;
    let mut reader = BufReader::new(file);

    match format {
        SnapshotFormat::Npy => read_npy(&mut reader),
        SnapshotFormat::Json => {
            let record: SnapshotRecord = serde_json::from_reader(reader)?;
            Ok(record.samples)
        }
    }
}

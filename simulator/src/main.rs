use anyhow::Context;
use clap::Parser;
use sinecore::analysis::estimate_frequency;
use sinecore::snapshot::{load_snapshot, SnapshotFormat};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::WorkflowConfig;
use workflow::runner::{run_length, RealtimeOptions, Runner};

mod control_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Real-time sine wave generator and snapshot recorder")]
struct Args {
    /// Replay a span of logical time as fast as possible and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 100.0)]
    sample_rate: f64,
    #[arg(long, default_value_t = 10.0)]
    frequency: f64,
    /// Seconds of history kept in memory
    #[arg(long, default_value_t = 300.0)]
    history_seconds: f64,
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Snapshot encoding: npy or json
    #[arg(long, default_value = "npy")]
    format: SnapshotFormat,
    /// Run length in seconds (logical when offline, wall-clock otherwise)
    #[arg(long)]
    seconds: Option<f64>,
    /// Serve the HTTP control bridge during a real-time run
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Begin stopped; generation starts on POST /start
    #[arg(long, default_value_t = false)]
    paused: bool,
    /// Print the dominant frequency of a saved snapshot and exit
    #[arg(long)]
    estimate: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    if let Some(seconds) = args.seconds {
        run_length(seconds).context("validating --seconds")?;
    }

    let workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(
            args.sample_rate,
            args.frequency,
            args.history_seconds,
            args.data_dir.clone(),
            args.format,
        )
    };

    if let Some(path) = args.estimate {
        let samples = load_snapshot(&path)
            .with_context(|| format!("loading snapshot {}", path.display()))?;
        let frequency = estimate_frequency(&samples, workflow_config.sample_rate)
            .with_context(|| format!("estimating frequency of {}", path.display()))?;
        println!(
            "{} -> {:.3} Hz ({} samples at {} samples/s)",
            path.display(),
            frequency,
            samples.len(),
            workflow_config.sample_rate
        );
        return Ok(());
    }

    let runner = Runner::new(workflow_config.clone());

    if args.offline {
        let seconds = args.seconds.unwrap_or(10.0);
        let summary = runner.run_offline(seconds)?;
        let estimate = summary
            .estimated_frequency
            .map(|value| format!("{:.3} Hz", value))
            .unwrap_or_else(|| "n/a".into());

        println!(
            "Offline run -> generated {}, retained {}, snapshots {}, failures {}, frequency {} Hz, estimated {}",
            summary.generated,
            summary.retained,
            summary.snapshots.len(),
            summary.failures,
            summary.frequency,
            estimate
        );

        let report = format!(
            "seconds={} generated={} retained={} snapshots={} failures={} frequency={} estimated={}\n",
            seconds,
            summary.generated,
            summary.retained,
            summary.snapshots.len(),
            summary.failures,
            summary.frequency,
            estimate
        );
        fs::create_dir_all(&workflow_config.data_dir).with_context(|| {
            format!("creating data directory {}", workflow_config.data_dir.display())
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(workflow_config.data_dir.join("offline_runs.log"))
            .context("opening offline run log")?;
        file.write_all(report.as_bytes())?;
        return Ok(());
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the real-time loop")?;
    runtime.block_on(runner.run_realtime(RealtimeOptions {
        serve: args.serve,
        paused: args.paused,
        seconds: args.seconds,
    }))
}

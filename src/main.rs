//! idle-time - report how long the user has been idle.
//!
//! Picks the first idle monitor that works on this machine and prints the
//! idle time once, or keeps watching and prints idle/active transitions.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use idle_time::config::Config;
use idle_time::logging::init_tracing;
use idle_time::{registry, select, IdleError, IdleMonitor, MonitorOptions};

/// Application version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(version, about = "Report how long the user has been idle")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Idle threshold in seconds.
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Only try this backend (repeatable, registry order still applies).
    #[arg(short, long = "backend")]
    backends: Vec<String>,

    /// Print reports as JSON lines.
    #[arg(long)]
    json: bool,

    /// Keep polling every SECONDS and print idle/active transitions.
    #[arg(short, long, value_name = "SECONDS")]
    watch: Option<u64>,

    /// List the backends compiled in for this platform, in priority order.
    #[arg(long)]
    list_backends: bool,
}

/// One idle measurement.
#[derive(Debug, Serialize)]
struct IdleReport {
    backend: &'static str,
    idle_seconds: f64,
    idle: bool,
    threshold_seconds: f64,
    idle_since: DateTime<Utc>,
}

impl IdleReport {
    fn measure(monitor: &mut dyn IdleMonitor) -> Result<Self, IdleError> {
        let idle_seconds = monitor.get_idle_time()?;
        let threshold_seconds = monitor.idle_threshold();
        let since = chrono::Duration::milliseconds((idle_seconds * 1000.0) as i64);
        Ok(Self {
            backend: monitor.name(),
            idle_seconds,
            idle: idle_seconds > threshold_seconds,
            threshold_seconds,
            idle_since: Utc::now() - since,
        })
    }

    fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string(self)?);
        } else {
            println!(
                "{}: idle for {:.1}s (threshold {:.0}s) - {}, last input at {}",
                self.backend,
                self.idle_seconds,
                self.threshold_seconds,
                if self.idle { "idle" } else { "active" },
                self.idle_since.format("%Y-%m-%d %H:%M:%S UTC"),
            );
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let registry = registry::global();
    if args.list_backends {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(threshold) = args.threshold {
        config.idle.threshold_seconds = threshold;
    }
    if !args.backends.is_empty() {
        config.idle.backends = args.backends.clone();
    }
    config.validate(registry)?;

    init_tracing(&config.logging.level, config.logging.format)?;
    info!("Starting idle-time v{}", VERSION);

    let options = config.idle.monitor_options();
    let mut monitor = select(&options).context("No idle monitor works in this session")?;

    match args.watch {
        None => IdleReport::measure(monitor.as_mut())?.print(args.json),
        Some(secs) => watch(monitor, &options, Duration::from_secs(secs.max(1)), args.json),
    }
}

/// Poll forever, printing the first report and every idle/active transition.
///
/// A monitor that stops answering is replaced by running selection again,
/// once; if that also fails the error is returned.
fn watch(
    mut monitor: Box<dyn IdleMonitor>,
    options: &MonitorOptions,
    interval: Duration,
    json: bool,
) -> Result<()> {
    let mut was_idle = None;

    loop {
        let report = match IdleReport::measure(monitor.as_mut()) {
            Ok(report) => report,
            Err(e) if e.is_recoverable_by_reselect() => {
                warn!("{} idle monitor stopped working: {}", monitor.name(), e);
                monitor = select(options).context("Re-selecting idle monitor failed")?;
                IdleReport::measure(monitor.as_mut())?
            }
            Err(e) => return Err(e.into()),
        };

        if was_idle != Some(report.idle) {
            report.print(json)?;
            was_idle = Some(report.idle);
        }

        std::thread::sleep(interval);
    }
}

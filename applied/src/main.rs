//! Demo runner for the applied executors and collections.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info};

use applied::demos;
use applied::host::HostConfig;
use applied::logging::{self, LogConfig};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "applied-demo")]
#[command(about = "Runs the bundled applied collection and keyed executor demos")]
#[command(version)]
struct Args {
    /// Demos to run (all when omitted)
    demos: Vec<String>,

    /// JSON host configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Workers per pool, overriding the configuration file
    #[arg(short, long)]
    workers: Option<usize>,

    /// Minimum log level, overriding the configuration file
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Debug logging with scheduler tracing, ignoring the configured level
    #[arg(long, conflicts_with = "json")]
    dev: bool,

    /// JSON logging at INFO level, ignoring the configured level
    #[arg(long)]
    json: bool,

    /// List the available demos and exit
    #[arg(short, long)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut host = match &args.config {
        Some(path) => HostConfig::load(path)
            .with_context(|| format!("loading host configuration from {}", path.display()))?,
        None => HostConfig::default(),
    };
    if args.workers.is_some() {
        host.worker_count = args.workers;
    }
    if args.log_level.is_some() {
        host.log_level = args.log_level.clone();
    }
    if !args.demos.is_empty() {
        host.demos = args.demos.clone();
    }

    let log_config = if args.dev {
        LogConfig::development()
    } else if args.json {
        LogConfig::production()
    } else {
        host.log_config()?
    };
    match &args.log_file {
        Some(path) => logging::init_with_file(log_config, &path.to_string_lossy())
            .with_context(|| format!("opening log file {}", path.display()))?,
        None => logging::init(log_config),
    }

    let executor_config = host.executor_config()?;
    let registry = demos::bundled(&executor_config);

    if args.list {
        for name in registry.names() {
            let version = registry.demo_class_version(name)?;
            println!("{:<16} {:.1}", name, version);
        }
        return Ok(());
    }

    let selected: Vec<String> = if host.demos.is_empty() {
        registry.names().into_iter().map(String::from).collect()
    } else {
        host.demos.clone()
    };

    info!(workers = executor_config.worker_count, demos = selected.len(), "running demos");

    let mut failures = 0;
    for name in &selected {
        if let Err(e) = registry.run_demo(name) {
            error!(demo = %name, "{:#}", anyhow::Error::from(e));
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} of {} demos failed", failures, selected.len());
    }
    Ok(())
}

//! # Smart Farm Controller Binary
//!
//! Runs the control loop, decision log, alert monitor and simulated sensor in
//! one process until SIGINT/SIGTERM (or `--duration-secs`) and then shuts
//! everything down in order.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (config/farm.toml if present, simulation driver)
//! farm_control
//!
//! # Custom config and log file, verbose
//! farm_control --config /etc/farm/farm.toml --log-file /var/log/farm.log -v
//!
//! # Bounded run with JSON diagnostics
//! farm_control --duration-secs 30 --json
//! ```

#![deny(warnings)]

use clap::Parser;
use farm_common::config::{FarmConfig, LogLevel};
use farm_common::consts::DEFAULT_CONFIG_PATH;
use farm_control::{FarmSystem, ShutdownReport};
use farm_sim::DriverRegistry;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Smart farm controller - threshold control of heater and fan with alerting
#[derive(Parser, Debug)]
#[command(name = "farm_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Greenhouse controller with decision log, alerts and ordered shutdown")]
#[command(long_about = None)]
struct Args {
    /// Path to the configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the decision log path
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Override the sensor driver
    #[arg(short, long)]
    driver: Option<String>,

    /// Stop automatically after this many seconds
    #[arg(long, value_name = "SECS")]
    duration_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Config is read before tracing exists so its level can seed the filter.
    let config = FarmConfig::load_or_default(&args.config);
    let level = match &config {
        Ok(c) => c.shared.log_level,
        Err(_) => LogLevel::Info,
    };
    setup_tracing(&args, level);

    info!("Smart farm controller v{} starting...", env!("CARGO_PKG_VERSION"));
    log_host_info();

    let result = match config {
        Ok(config) => run(&args, config),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        error!("Smart farm controller failed: {}", e);
        std::process::exit(1);
    }
    info!("Smart farm controller shutdown complete");
}

fn run(args: &Args, mut config: FarmConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &args.log_file {
        config.log.path = path.clone();
    }
    if let Some(driver) = &args.driver {
        config.sensor.driver = driver.clone();
    }

    let registry = DriverRegistry::with_builtin();
    let driver = registry.create(&config.sensor)?;

    let system = FarmSystem::builder(config).with_sensor(driver).start()?;

    // Only the first signal matters; later ones find the slot taken.
    let (signal_tx, signal_rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = signal_tx.try_send(());
    })?;

    match args.duration_secs {
        Some(secs) => match signal_rx.recv_timeout(Duration::from_secs(secs)) {
            Ok(()) => info!("Received shutdown signal"),
            Err(_) => info!("Run duration of {}s elapsed", secs),
        },
        None => {
            if signal_rx.recv().is_ok() {
                info!("Received shutdown signal");
            }
        }
    }

    let report = system.stop();
    log_report(&report);
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.into()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .init();
    }
}

fn log_host_info() {
    info!(
        "Host: {} / {}, pid {}",
        std::env::consts::OS,
        std::env::consts::ARCH,
        std::process::id()
    );
}

fn log_report(report: &ShutdownReport) {
    info!("=== Final Run Statistics ===");
    if let Some(c) = &report.controller {
        info!(
            "  controller: {} cycles, {} readings processed, {} idle, {} overruns, max {}µs",
            c.cycle_count,
            c.processed,
            c.idle,
            c.overruns,
            c.max_cycle_ns / 1_000
        );
    }
    if let Some(l) = &report.log {
        info!(
            "  decision log: {} written, {} failed, {} dropped",
            l.written, l.failed, report.log_dropped
        );
    }
    if let Some(a) = &report.alerts {
        info!("  alerts: {} raised over {} ticks", a.raised, a.ticks);
    }
    if let Some(s) = &report.sensor {
        info!("  sensor: {} readings sent over {} ticks", s.sent, s.ticks);
    }
    info!("  drained in {:?}", report.elapsed);
    if !report.is_clean() {
        warn!("  faulted tasks: {:?}", report.faulted);
    }
}

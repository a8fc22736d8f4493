//! # Omni Monitor Binary
//!
//! Attaches to the device segment, prints the device state about once per
//! second and applies a constant force along Z. Ctrl+C stops the loop; the
//! force is zeroed before detaching.
//!
//! # Usage
//!
//! ```bash
//! # Default System V key 777 at 100 Hz
//! omni_monitor
//!
//! # POSIX object, 10 cycles, 0.5 N along Z
//! omni_monitor --name omni_state --cycles 10 --force-z 0.5
//!
//! # Config file, verbose JSON logs
//! omni_monitor --config client.toml -v --json
//! ```

#![deny(warnings)]

use clap::Parser;
use omni_common::config::LogLevel;
use omni_monitor::{Monitor, Overrides, load_config, resolve};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Omni Monitor - Phantom Omni shared-memory state monitor
#[derive(Parser, Debug)]
#[command(name = "omni_monitor")]
#[command(version)]
#[command(about = "Phantom Omni shared-memory state monitor and force command demo")]
#[command(long_about = None)]
struct Args {
    /// System V key of the device segment
    #[arg(short, long, conflicts_with = "name")]
    key: Option<i32>,

    /// POSIX shared memory object name of the device segment
    #[arg(short, long)]
    name: Option<String>,

    /// Path to client configuration (client.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Poll rate in Hz
    #[arg(short, long)]
    rate_hz: Option<f64>,

    /// Stop after this many cycles (0 = until Ctrl+C)
    #[arg(long, default_value_t = 0)]
    cycles: u64,

    /// Constant force along Z sent every cycle
    #[arg(short = 'f', long, default_value_t = 0.0, allow_negative_numbers = true)]
    force_z: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            key: self.key,
            name: self.name.clone(),
            rate_hz: self.rate_hz,
            cycles: self.cycles,
            force_z: self.force_z,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Monitor failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref());
    let level = match &config {
        Ok(config) => config.shared.log_level,
        Err(_) => LogLevel::Info,
    };
    setup_tracing(&args, level);

    info!("Omni Monitor v{} starting...", env!("CARGO_PKG_VERSION"));
    let settings = resolve(config?, &args.overrides())?;
    info!(
        "Service {} attaching to {}",
        settings.service_name, settings.segment
    );

    let mut monitor = Monitor::attach(settings)?;

    let running = monitor.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let result = monitor.run();
    if let Err(e) = &result {
        error!("Monitor loop error: {}", e);
    }
    monitor.shutdown()?;

    info!("Omni Monitor shutdown complete");
    result.map_err(Into::into)
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose { "debug" } else { level.as_str() };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

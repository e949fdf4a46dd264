//! # OVL HAL Binary
//!
//! Loads an overlay through the selected backend and performs register
//! operations on its regions.
//!
//! # Usage
//!
//! ```bash
//! # List the regions of the configured overlay (simulation backend)
//! ovl_hal --config config/host.toml --backend sim regions
//!
//! # Read / write one register on hardware
//! OVL_BACKEND=devmem ovl_hal -c config/host.toml read axi_gpio 0x0
//! ovl_hal -c config/host.toml write axi_gpio 0x8 0x1 --width 4
//!
//! # Run a register-access script, JSON output
//! ovl_hal -c config/host.toml --json run config/bringup.ovl
//! ```
//!
//! Backend precedence: `--backend`, then `OVL_BACKEND`, then `[backend] kind`.

use clap::{Parser, Subcommand};
use ovl_common::config::{HostConfig, LogLevel};
use ovl_common::consts::{BACKEND_ENV_VAR, DEFAULT_ACCESS_WIDTH, DEFAULT_CONFIG_PATH};
use ovl_common::hal::config::BackendKind;
use ovl_hal::script::parse_number;
use ovl_hal::{AccessOp, AccessOutcome, BackendRegistry, HostError, Session, parse_script};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// OVL HAL - overlay and register-window access with pluggable backends
#[derive(Parser, Debug)]
#[command(name = "ovl_hal")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Overlay / register-window access with pluggable backends")]
#[command(long_about = None)]
struct Args {
    /// Path to host configuration file (host.toml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Backend override (sim | devmem)
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs and results in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered backends
    Backends,

    /// List the regions declared by the overlay
    Regions,

    /// Read one or more consecutive registers
    Read {
        /// Region name
        region: String,
        /// Byte offset (decimal or 0x hex)
        #[arg(value_parser = parse_offset)]
        offset: usize,
        /// Access width in bytes
        #[arg(short, long, default_value_t = DEFAULT_ACCESS_WIDTH)]
        width: usize,
        /// Number of consecutive registers
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Write one or more consecutive registers
    Write {
        /// Region name
        region: String,
        /// Byte offset (decimal or 0x hex)
        #[arg(value_parser = parse_offset)]
        offset: usize,
        /// Values (decimal or 0x hex)
        #[arg(required = true, value_parser = parse_value)]
        values: Vec<u64>,
        /// Access width in bytes
        #[arg(short, long, default_value_t = DEFAULT_ACCESS_WIDTH)]
        width: usize,
    },

    /// Run a register-access script
    Run {
        /// Script file
        script: PathBuf,
    },
}

/// Region listing entry for `regions`.
#[derive(Serialize)]
struct RegionEntry<'a> {
    name: &'a str,
    base: u64,
    length: usize,
}

fn parse_value(text: &str) -> Result<u64, String> {
    parse_number(text).ok_or_else(|| format!("invalid number '{text}'"))
}

fn parse_offset(text: &str) -> Result<usize, String> {
    parse_value(text).and_then(|n| usize::try_from(n).map_err(|e| e.to_string()))
}

fn main() {
    let args = Args::parse();
    let config = config_for(&args);

    let level = match &config {
        Ok(Some(c)) => c.shared.log_level,
        _ => LogLevel::default(),
    };
    setup_tracing(&args, level);

    let result = config.and_then(|config| match config {
        Some(config) => run(&args, config),
        None => {
            for name in BackendRegistry::with_builtins().list_backends() {
                println!("{name}");
            }
            Ok(())
        }
    });
    if let Err(e) = result {
        error!("ovl_hal failed: {}", e);
        std::process::exit(1);
    }
}

/// Host configuration the command needs; `backends` needs none.
fn config_for(args: &Args) -> Result<Option<HostConfig>, HostError> {
    match args.command {
        Command::Backends => Ok(None),
        _ => Session::load_config(&args.config).map(Some),
    }
}

fn run(args: &Args, mut config: HostConfig) -> Result<(), HostError> {
    info!("OVL HAL v{} starting...", env!("CARGO_PKG_VERSION"));

    let env_backend = std::env::var(BACKEND_ENV_VAR).ok();
    let kind = BackendKind::resolve(args.backend, env_backend.as_deref(), config.backend.kind)?;
    if kind != config.backend.kind {
        info!("Backend override: {}", kind);
        config.backend.kind = kind;
    }

    let mut session = Session::new(config, &BackendRegistry::with_builtins())?;
    let overlay = session.load_overlay()?;

    match &args.command {
        Command::Backends => {}
        Command::Regions => {
            let regions = overlay.regions();
            if args.json {
                let entries: Vec<_> = regions
                    .iter()
                    .map(|(name, desc)| RegionEntry {
                        name,
                        base: desc.base,
                        length: desc.length,
                    })
                    .collect();
                println!("{}", to_json(&entries)?);
            } else {
                for (name, desc) in &regions {
                    println!("{name:<24} {:#010x} {:#x}", desc.base, desc.length);
                }
            }
        }
        Command::Read {
            region,
            offset,
            width,
            count,
        } => {
            let op = if *count == 1 {
                AccessOp::Read {
                    region: region.clone(),
                    offset: *offset,
                    width: *width,
                }
            } else {
                AccessOp::ReadArray {
                    region: region.clone(),
                    offset: *offset,
                    count: *count,
                    width: *width,
                }
            };
            print_outcomes(args, &[session.execute(&op)?])?;
        }
        Command::Write {
            region,
            offset,
            values,
            width,
        } => {
            let outcomes = session.write_values(region, *offset, *width, values)?;
            print_outcomes(args, &outcomes)?;
        }
        Command::Run { script } => {
            let text = std::fs::read_to_string(script)?;
            let ops = parse_script(&text)?;
            info!("Running {} operations from {}", ops.len(), script.display());
            let outcomes = session.run_script(&ops)?;
            print_outcomes(args, &outcomes)?;
        }
    }

    session.unload();
    info!("OVL HAL done");
    Ok(())
}

fn print_outcomes(args: &Args, outcomes: &[AccessOutcome]) -> Result<(), HostError> {
    if args.json {
        println!("{}", to_json(outcomes)?);
    } else {
        for outcome in outcomes {
            println!("{outcome}");
        }
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, HostError> {
    serde_json::to_string_pretty(value).map_err(|e| HostError::Io {
        source: std::io::Error::other(e),
    })
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        level.as_level()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs go to stderr so stdout stays parseable.
    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

mod cli;
mod error_fmt;
mod export;

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use turbidostat_config::Config;
use turbidostat_core::{Chamber, ControlLoop, FileLogger, LoopParams, StateStore};
use turbidostat_traits::{Link, SystemClock};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut cfg = turbidostat_config::load_file(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    apply_overrides(&mut cfg, &cli);
    cfg.validate()?;
    if cfg.gain_ratio() <= 15.0 {
        tracing::warn!(ratio = cfg.gain_ratio(), "kp/ki should be above 15");
    }

    match cli.cmd {
        Some(Commands::ListPorts) => {
            list_ports();
            return Ok(());
        }
        Some(Commands::ExportCsv { input, output }) => {
            let summary = export::export_file(&input, &output)?;
            println!(
                "wrote {} rows to {} ({} skipped)",
                summary.rows,
                output.display(),
                summary.skipped
            );
            return Ok(());
        }
        None => {}
    }

    let link = open_link(&cfg)?;
    let mut chamber = Chamber::new(link, SystemClock::new(), cfg.control.use_aux_pulse);

    if cli.test {
        let raw = chamber.read_raw()?;
        println!("({}, {})", raw.tx, raw.rx);
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let sink = FileLogger::open(&cfg.paths.log_file)
        .wrap_err_with(|| format!("open data log {}", cfg.paths.log_file.display()))?
        .echo(true);
    let store = StateStore::new(&cfg.paths.state_file);
    let params = LoopParams::from(&cfg);

    let mut control = ControlLoop::start(chamber, store, sink, params)?;
    let cycles = control.run(&shutdown, cli.cycles)?;
    tracing::info!(
        cycles,
        state = %cfg.paths.state_file.display(),
        log = %cfg.paths.log_file.display(),
        "controller stopped"
    );
    Ok(())
}

/// CLI flags win over the config file.
fn apply_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(port) = &cli.port {
        cfg.serial.port.clone_from(port);
    }
    if let Some(sp) = &cli.setpoint {
        match sp.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => cfg.control.setpoint = v,
            _ => tracing::warn!(
                value = %sp,
                kept = cfg.control.setpoint,
                "could not parse --setpoint; keeping configured setpoint"
            ),
        }
    }
    if let Some(path) = &cli.logfile {
        cfg.paths.log_file.clone_from(path);
    }
    if let Some(path) = &cli.state_file {
        cfg.paths.state_file.clone_from(path);
    }
    if cli.growth_test {
        cfg.control.growth_test = true;
    }
}

fn list_ports() {
    let ports = turbidostat_hardware::available_ports();
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for p in ports {
        println!("{p}");
    }
}

#[cfg(feature = "hardware")]
fn open_link(cfg: &Config) -> Result<Box<dyn Link>> {
    let link = turbidostat_hardware::SerialLink::open(
        &cfg.serial.port,
        cfg.serial.baud,
        std::time::Duration::from_millis(cfg.serial.read_timeout_ms),
    )?;
    tracing::info!(port = %cfg.serial.port, baud = cfg.serial.baud, "serial link open");
    Ok(Box::new(link))
}

#[cfg(not(feature = "hardware"))]
fn open_link(cfg: &Config) -> Result<Box<dyn Link>> {
    let mut board = turbidostat_hardware::SimulatedBoard::new();
    if let Ok(v) = std::env::var("TURBIDOSTAT_SIM_OD") {
        match v.parse::<f64>() {
            Ok(od) => board = board.with_od(od),
            Err(e) => tracing::warn!(value = %v, error = %e, "ignoring TURBIDOSTAT_SIM_OD"),
        }
    }
    if std::env::var("TURBIDOSTAT_SIM_TIMEOUT").is_ok_and(|v| v == "1") {
        board = board.silent(true);
    }
    tracing::info!(
        port = %cfg.serial.port,
        timeout_ms = cfg.serial.read_timeout_ms,
        "using simulated board (built without `hardware`)"
    );
    Ok(Box::new(board))
}

/// Console logs go to stderr so stdout carries only data lines.
fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    logging: &turbidostat_config::Logging,
) -> Result<()> {
    let level = cli_level.or(logging.level.as_deref()).unwrap_or("info");
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.is_empty() => EnvFilter::try_new(spec),
        _ => EnvFilter::try_new(level),
    }
    .wrap_err("invalid log level")?;

    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(false)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(filter)
        .try_init()
        .map_err(|e| eyre::eyre!("failed to initialize logging: {e}"))
}

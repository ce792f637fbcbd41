//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "turbidostat", version, about = "Turbidostat controller")]
pub struct Cli {
    /// Path to config TOML (missing file means built-in defaults)
    #[arg(long, value_name = "FILE", default_value = "etc/turbidostat.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Take a single raw reading, print `(tx, rx)` and exit
    #[arg(short = 't', long = "test", action = ArgAction::SetTrue)]
    pub test: bool,

    /// Serial port of the chamber board
    #[arg(long, value_name = "PORT")]
    pub port: Option<String>,

    /// Target OD. Kept as text so a typo only warns.
    #[arg(long, value_name = "OD", allow_hyphen_values = true)]
    pub setpoint: Option<String>,

    /// Append-only data log
    #[arg(long, value_name = "FILE")]
    pub logfile: Option<PathBuf>,

    /// Enable the periodic growth-rate test
    #[arg(short = 'g', long = "growth-test", action = ArgAction::SetTrue)]
    pub growth_test: bool,

    /// Persisted controller state
    #[arg(long = "state-file", value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Stop after this many control cycles
    #[arg(long, value_name = "N")]
    pub cycles: Option<u64>,

    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List serial ports visible to this machine
    ListPorts,
    /// Convert the data log to CSV (`Time, OD`, UTC timestamps)
    ExportCsv {
        #[arg(long, value_name = "FILE", default_value = "log.dat")]
        input: PathBuf,
        #[arg(long, value_name = "FILE", default_value = "log.csv")]
        output: PathBuf,
    },
}

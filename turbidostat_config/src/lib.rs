#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the turbidostat controller.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Every section has defaults matching the reference operating point, so an
//!   absent file or an empty table yields a runnable configuration.
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SerialCfg {
    /// Port identifier (`COM4`, `/dev/ttyUSB0`, `/dev/cu.usbserial`, ...)
    pub port: String,
    pub baud: u32,
    /// Bounded wait for the 8-byte sensor reply
    pub read_timeout_ms: u64,
}

impl Default for SerialCfg {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud: 19_200,
            read_timeout_ms: 500,
        }
    }
}

const fn default_port() -> &'static str {
    if cfg!(windows) { "COM4" } else { "/dev/ttyUSB0" }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlCfg {
    /// Target OD
    pub setpoint: f64,
    /// Proportional gain. Larger is faster but gives more cycle-to-cycle
    /// variation in dilution volume. Keep kp/ki > 15.
    pub kp: f64,
    pub ki: f64,
    /// Seconds between control cycles
    pub dilute_period_s: u64,
    /// Pulse the auxiliary valve line after each command
    pub use_aux_pulse: bool,
    /// Enable the periodic growth-rate test
    pub growth_test: bool,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            setpoint: 0.4,
            kp: 300.0,
            ki: 8.0,
            dilute_period_s: 60,
            use_aux_pulse: true,
            growth_test: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GrowthTestCfg {
    /// Test repeats every `period_s` of wall-clock time
    pub period_s: u64,
    /// Dilute-down is forced during the first `window_s` of each period
    pub window_s: u64,
    /// Dilute down to `setpoint - depth` before letting the culture grow
    pub depth: f64,
}

impl Default for GrowthTestCfg {
    fn default() -> Self {
        Self {
            period_s: 8 * 60 * 60,
            window_s: 2 * 60,
            depth: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Paths {
    /// Persisted controller state (integral + blank)
    pub state_file: PathBuf,
    /// Append-only per-cycle data log
    pub log_file: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("state.json"),
            log_file: PathBuf::from("log.dat"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RuntimeCfg {
    /// Settle time between capturing the blank and the first cycle
    pub startup_delay_s: u64,
    /// Attempts per state save before the cycle counts as a failed save
    pub save_retries: u32,
    /// Consecutive cycles with a failed save before the loop gives up
    pub max_failed_saves: u32,
    /// Attempts at capturing a fresh blank on first run
    pub blank_retries: u32,
}

impl Default for RuntimeCfg {
    fn default() -> Self {
        Self {
            startup_delay_s: 5,
            save_retries: 3,
            max_failed_saves: 5,
            blank_retries: 3,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to diagnostic .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub serial: SerialCfg,
    pub control: ControlCfg,
    pub growth_test: GrowthTestCfg,
    pub paths: Paths,
    pub runtime: RuntimeCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. A missing file yields the defaults.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    match std::fs::read_to_string(path) {
        Ok(text) => load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration {path:?}: {e}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(eyre::eyre!("read config {path:?}: {e}")),
    }
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.port.trim().is_empty() {
            eyre::bail!("serial.port must not be empty");
        }
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        if self.serial.read_timeout_ms == 0 {
            eyre::bail!("serial.read_timeout_ms must be >= 1");
        }
        if self.serial.read_timeout_ms > 60_000 {
            eyre::bail!("serial.read_timeout_ms is unreasonably large (>60s)");
        }

        // Control
        if !self.control.setpoint.is_finite() {
            eyre::bail!("control.setpoint must be a finite number");
        }
        if !(self.control.kp.is_finite() && self.control.kp > 0.0) {
            eyre::bail!("control.kp must be > 0");
        }
        if !(self.control.ki.is_finite() && self.control.ki > 0.0) {
            eyre::bail!("control.ki must be > 0");
        }
        if self.control.dilute_period_s == 0 {
            eyre::bail!("control.dilute_period_s must be >= 1");
        }

        // Growth test
        if self.growth_test.period_s == 0 {
            eyre::bail!("growth_test.period_s must be >= 1");
        }
        if self.growth_test.window_s >= self.growth_test.period_s {
            eyre::bail!("growth_test.window_s must be shorter than growth_test.period_s");
        }
        if !(self.growth_test.depth.is_finite() && self.growth_test.depth > 0.0) {
            eyre::bail!("growth_test.depth must be > 0");
        }

        // Paths
        if self.paths.state_file.as_os_str().is_empty() {
            eyre::bail!("paths.state_file must not be empty");
        }
        if self.paths.log_file.as_os_str().is_empty() {
            eyre::bail!("paths.log_file must not be empty");
        }

        // Runtime
        if self.runtime.save_retries == 0 {
            eyre::bail!("runtime.save_retries must be >= 1");
        }
        if self.runtime.max_failed_saves == 0 {
            eyre::bail!("runtime.max_failed_saves must be >= 1");
        }
        if self.runtime.blank_retries == 0 {
            eyre::bail!("runtime.blank_retries must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }

    /// Ratio kp/ki; values at or below 15 are known to oscillate.
    pub fn gain_ratio(&self) -> f64 {
        self.control.kp / self.control.ki
    }
}

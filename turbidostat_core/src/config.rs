//! Runtime configuration for the control loop.
//!
//! These are immutable once the loop is built. They are separate from the
//! TOML-deserialized config in `turbidostat_config`.

use std::time::Duration;

/// Control law and cadence.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Target OD.
    pub setpoint: f64,
    /// Proportional gain. Stable operation needs `kp / ki > 15`.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Time between cycles.
    pub dilute_period: Duration,
    /// Pulse the auxiliary valve line after each transaction.
    pub use_aux_pulse: bool,
    /// Run the periodic growth test.
    pub growth_test_enabled: bool,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            setpoint: 0.4,
            kp: 300.0,
            ki: 8.0,
            dilute_period: Duration::from_secs(60),
            use_aux_pulse: true,
            growth_test_enabled: false,
        }
    }
}

/// Growth-test schedule.
#[derive(Debug, Clone)]
pub struct GrowthTestCfg {
    /// The test restarts every `period` of wall-clock time.
    pub period: Duration,
    /// Dilute-down is forced during the first `window` of each period.
    pub window: Duration,
    /// Dilute down to `setpoint - depth`.
    pub depth: f64,
}

impl Default for GrowthTestCfg {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(8 * 60 * 60),
            window: Duration::from_secs(2 * 60),
            depth: 0.1,
        }
    }
}

/// Startup and persistence policy.
#[derive(Debug, Clone)]
pub struct RuntimeCfg {
    /// Pause between restoring state and the first cycle.
    pub startup_delay: Duration,
    /// Attempts per save before the cycle counts as failed.
    pub save_retries: u32,
    /// Consecutive failed saves tolerated before the loop aborts.
    pub max_failed_saves: u32,
    /// Attempts at reading a fresh blank on first run.
    pub blank_retries: u32,
}

impl Default for RuntimeCfg {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(5),
            save_retries: 3,
            max_failed_saves: 5,
            blank_retries: 3,
        }
    }
}

/// Everything the control loop is parameterized by.
#[derive(Debug, Clone, Default)]
pub struct LoopParams {
    pub control: ControlCfg,
    pub growth: GrowthTestCfg,
    pub runtime: RuntimeCfg,
}

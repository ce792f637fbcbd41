//! `From` implementations bridging `turbidostat_config` types to core types.

use std::time::Duration;

use crate::config::{ControlCfg, GrowthTestCfg, LoopParams, RuntimeCfg};

// ── ControlCfg ───────────────────────────────────────────────────────────────

impl From<&turbidostat_config::ControlCfg> for ControlCfg {
    fn from(c: &turbidostat_config::ControlCfg) -> Self {
        Self {
            setpoint: c.setpoint,
            kp: c.kp,
            ki: c.ki,
            dilute_period: Duration::from_secs(c.dilute_period_s),
            use_aux_pulse: c.use_aux_pulse,
            growth_test_enabled: c.growth_test,
        }
    }
}

// ── GrowthTestCfg ────────────────────────────────────────────────────────────

impl From<&turbidostat_config::GrowthTestCfg> for GrowthTestCfg {
    fn from(c: &turbidostat_config::GrowthTestCfg) -> Self {
        Self {
            period: Duration::from_secs(c.period_s),
            window: Duration::from_secs(c.window_s),
            depth: c.depth,
        }
    }
}

// ── RuntimeCfg ───────────────────────────────────────────────────────────────

impl From<&turbidostat_config::RuntimeCfg> for RuntimeCfg {
    fn from(c: &turbidostat_config::RuntimeCfg) -> Self {
        Self {
            startup_delay: Duration::from_secs(c.startup_delay_s),
            save_retries: c.save_retries,
            max_failed_saves: c.max_failed_saves,
            blank_retries: c.blank_retries,
        }
    }
}

// ── LoopParams ───────────────────────────────────────────────────────────────

impl From<&turbidostat_config::Config> for LoopParams {
    fn from(c: &turbidostat_config::Config) -> Self {
        Self {
            control: (&c.control).into(),
            growth: (&c.growth_test).into(),
            runtime: (&c.runtime).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_defaults() {
        let params = LoopParams::from(&turbidostat_config::Config::default());
        assert_eq!(params.control.dilute_period, Duration::from_secs(60));
        assert!(params.control.use_aux_pulse);
        assert!(!params.control.growth_test_enabled);
        assert_eq!(params.growth.window, Duration::from_secs(120));
        assert_eq!(params.runtime.startup_delay, Duration::from_secs(5));
    }
}

//! PI dilution control with anti-windup, plus the growth-test override.
//!
//! Per cycle in normal mode:
//! 1. `err = od - setpoint`
//! 2. `z = clamp(z + ki * err, 0, 255)` (the integral alone is saturated)
//! 3. `u = clamp(round(z + kp * err), 0, 255)`
//!
//! The growth test replaces the PI law with a two-phase bang-bang sequence
//! and freezes `z` while it runs.

use std::time::Duration;

use tracing::info;

use crate::config::{ControlCfg, GrowthTestCfg};
use crate::types::GrowthPhase;

/// Integral accumulator bounds (inclusive).
pub const Z_MIN: f64 = 0.0;
pub const Z_MAX: f64 = 255.0;

/// Command for full dilution.
pub const U_FULL: u8 = u8::MAX;

/// Proportional-integral law with a saturated integral.
#[derive(Debug, Clone)]
pub struct PiController {
    kp: f64,
    ki: f64,
    z: f64,
}

impl PiController {
    /// `z` is clamped into `[Z_MIN, Z_MAX]`; a non-finite `z` starts at zero.
    pub fn new(kp: f64, ki: f64, z: f64) -> Self {
        let z = if z.is_finite() { z.clamp(Z_MIN, Z_MAX) } else { Z_MIN };
        Self { kp, ki, z }
    }

    /// Current integral accumulator.
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Advance the integral and return the saturated actuator command.
    pub fn update(&mut self, od: f64, setpoint: f64) -> u8 {
        let err = od - setpoint;
        debug_assert!(err.is_finite(), "non-finite control error");
        self.z = (self.z + self.ki * err).clamp(Z_MIN, Z_MAX);
        let u = (self.z + self.kp * err).round().clamp(0.0, f64::from(U_FULL));
        // In range after the clamp; NaN saturates to 0.
        u as u8
    }
}

/// Periodic dilute-down-then-grow sequence for measuring growth rate.
#[derive(Debug, Clone)]
pub struct GrowthTest {
    period_s: u64,
    window_s: u64,
    depth: f64,
    phase: GrowthPhase,
}

impl GrowthTest {
    pub fn new(cfg: &GrowthTestCfg) -> Self {
        Self {
            period_s: cfg.period.as_secs().max(1),
            window_s: cfg.window.as_secs(),
            depth: cfg.depth,
            phase: GrowthPhase::Normal,
        }
    }

    pub fn phase(&self) -> GrowthPhase {
        self.phase
    }

    /// True during the first `window` of each wall-clock `period`.
    pub fn in_window(&self, epoch: Duration) -> bool {
        epoch.as_secs() % self.period_s < self.window_s
    }

    /// Command overriding the PI law, or `None` when PI control applies.
    ///
    /// The command of a transition cycle belongs to the phase being left:
    /// the cycle that drops below `setpoint - depth` still dilutes fully, the
    /// cycle that rises above `setpoint` still withholds dilution.
    pub fn command(&mut self, od: f64, setpoint: f64, epoch: Duration) -> Option<u8> {
        if self.in_window(epoch) && self.phase != GrowthPhase::DiluteDown {
            info!(from = self.phase.as_str(), od, "growth test: diluting down");
            self.phase = GrowthPhase::DiluteDown;
        }
        match self.phase {
            GrowthPhase::Normal => None,
            GrowthPhase::DiluteDown => {
                if od < setpoint - self.depth {
                    info!(od, "growth test: growing");
                    self.phase = GrowthPhase::Grow;
                }
                Some(U_FULL)
            }
            GrowthPhase::Grow => {
                if od > setpoint {
                    info!(od, "growth test: back to normal control");
                    self.phase = GrowthPhase::Normal;
                }
                Some(0)
            }
        }
    }
}

/// Outcome of one control decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Actuator command.
    pub u: u8,
    /// Phase that produced the command.
    pub phase: GrowthPhase,
    /// Integral after the decision.
    pub z: f64,
    /// True when the PI law ran and the new `z` must be persisted.
    pub integral_updated: bool,
}

/// PI law combined with the optional growth test.
#[derive(Debug, Clone)]
pub struct Controller {
    setpoint: f64,
    pi: PiController,
    growth: Option<GrowthTest>,
}

impl Controller {
    /// Build from the control configuration and a starting integral.
    pub fn new(control: &ControlCfg, growth: &GrowthTestCfg, z: f64) -> Self {
        Self {
            setpoint: control.setpoint,
            pi: PiController::new(control.kp, control.ki, z),
            growth: control.growth_test_enabled.then(|| GrowthTest::new(growth)),
        }
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn z(&self) -> f64 {
        self.pi.z()
    }

    pub fn phase(&self) -> GrowthPhase {
        self.growth
            .as_ref()
            .map_or(GrowthPhase::Normal, GrowthTest::phase)
    }

    /// Decide this cycle's command from the current OD and wall-clock time.
    pub fn decide(&mut self, od: f64, epoch: Duration) -> Decision {
        if let Some(gt) = self.growth.as_mut() {
            let phase = if gt.in_window(epoch) {
                GrowthPhase::DiluteDown
            } else {
                gt.phase()
            };
            if let Some(u) = gt.command(od, self.setpoint, epoch) {
                return Decision {
                    u,
                    phase,
                    z: self.pi.z(),
                    integral_updated: false,
                };
            }
        }
        let u = self.pi.update(od, self.setpoint);
        Decision {
            u,
            phase: GrowthPhase::Normal,
            z: self.pi.z(),
            integral_updated: true,
        }
    }
}

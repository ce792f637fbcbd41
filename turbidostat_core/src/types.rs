//! Data carried between the chamber, the controller, and storage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw (transmit, receive) light intensities from the sensor.
///
/// Persisted as a two-element array `[tx, rx]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct RawReading {
    pub tx: u32,
    pub rx: u32,
}

impl RawReading {
    pub const fn new(tx: u32, rx: u32) -> Self {
        Self { tx, rx }
    }
}

impl From<(u32, u32)> for RawReading {
    fn from((tx, rx): (u32, u32)) -> Self {
        Self { tx, rx }
    }
}

impl From<RawReading> for (u32, u32) {
    fn from(r: RawReading) -> Self {
        (r.tx, r.rx)
    }
}

impl fmt::Display for RawReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.tx, self.rx)
    }
}

/// Reference reading taken through clean medium.
pub type Calibration = RawReading;

/// Everything a restarted controller needs to resume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    /// Integral accumulator, always within `[0, 255]`.
    pub z: f64,
    pub blank: Calibration,
}

/// Growth-test sub-mode. Not persisted; a restart begins in `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthPhase {
    #[default]
    Normal,
    /// Full dilution until OD falls below `setpoint - depth`.
    DiluteDown,
    /// No dilution until OD rises back above the setpoint.
    Grow,
}

impl GrowthPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            GrowthPhase::Normal => "normal",
            GrowthPhase::DiluteDown => "dilute_down",
            GrowthPhase::Grow => "grow",
        }
    }
}

/// One line of the per-cycle data log.
///
/// `Display` renders the on-disk form:
/// `{"time":1700000000, "OD":0.5000, "Z":50.8000, "U":66}`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LogRecord {
    pub time: i64,
    #[serde(rename = "OD")]
    pub od: f64,
    #[serde(rename = "Z", default)]
    pub z: f64,
    #[serde(rename = "U", default)]
    pub u: u8,
}

impl LogRecord {
    /// Parse one line of the data log.
    pub fn parse_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"time\":{}, \"OD\":{:.4}, \"Z\":{:.4}, \"U\":{}}}",
            self.time, self.od, self.z, self.u
        )
    }
}

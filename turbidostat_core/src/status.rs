//! Result of one control cycle.

use crate::error::TurbidostatError;
use crate::types::{GrowthPhase, LogRecord};

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleStatus {
    /// Reading taken, command issued, record emitted.
    Completed(CycleReport),
    /// Reading failed; no control update, no dilution, no record.
    Skipped(TurbidostatError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub record: LogRecord,
    pub phase: GrowthPhase,
    /// True when the cycle fell back to the neutral OD.
    pub od_fallback: bool,
    /// True when the state file was written this cycle.
    pub state_saved: bool,
}

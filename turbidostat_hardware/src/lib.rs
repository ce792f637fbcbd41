pub mod error;
#[cfg(feature = "hardware")]
pub mod serial;
pub mod util;

use turbidostat_traits::{BoxError, Link};

#[cfg(feature = "hardware")]
pub use serial::{SerialLink, available_ports};

/// Port enumeration is unavailable without the `hardware` feature.
#[cfg(not(feature = "hardware"))]
pub fn available_ports() -> Vec<String> {
    Vec::new()
}

/// Transmit intensity the simulated LED produces.
const SIM_TX: u32 = 40_000;
/// Receive intensity through clean medium.
const SIM_RX_CLEAR: f64 = 30_000.0;

/// Simulated chamber board.
///
/// Answers every command byte with the current (tx, rx) pair as two
/// little-endian `u32`s, like the firmware does. The culture grows by a fixed
/// factor per exchange and each command byte dilutes it in proportion.
#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    od: f64,
    growth_per_exchange: f64,
    /// Fraction of culture replaced by a full (255) dilution command.
    max_dilution: f64,
    pending: Option<u8>,
    silent: bool,
    valve_open: bool,
    exchanges: u64,
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBoard {
    pub fn new() -> Self {
        Self {
            od: 0.0,
            growth_per_exchange: 1.02,
            max_dilution: 0.25,
            pending: None,
            silent: false,
            valve_open: false,
            exchanges: 0,
        }
    }

    /// Start the simulated culture at `od`.
    pub fn with_od(mut self, od: f64) -> Self {
        self.od = od.max(0.0);
        self
    }

    /// Never answer a command, so every read times out.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Current simulated OD.
    pub fn od(&self) -> f64 {
        self.od
    }

    pub fn valve_open(&self) -> bool {
        self.valve_open
    }

    /// Number of command bytes answered so far.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    fn reading(&self) -> (u32, u32) {
        // Small floor so a dense culture never reads as zero.
        let rx = (SIM_RX_CLEAR * 10f64.powf(-self.od)).round().max(1.0);
        (SIM_TX, rx as u32)
    }

    fn apply(&mut self, command: u8) {
        let dilution = self.max_dilution * f64::from(command) / 255.0;
        self.od = (self.od * self.growth_per_exchange * (1.0 - dilution)).max(0.0);
        // Keep a seed population so growth can resume after a full washout.
        if self.od < 1e-3 {
            self.od = 1e-3;
        }
    }
}

impl Link for SimulatedBoard {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        if let Some(&b) = bytes.last() {
            self.pending = Some(b);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BoxError> {
        if self.silent {
            return Ok(0);
        }
        let Some(command) = self.pending.take() else {
            return Ok(0);
        };
        let (tx, rx) = self.reading();
        let mut frame = [0u8; 8];
        frame[..4].copy_from_slice(&tx.to_le_bytes());
        frame[4..].copy_from_slice(&rx.to_le_bytes());
        let n = buf.len().min(frame.len());
        buf[..n].copy_from_slice(&frame[..n]);
        self.apply(command);
        self.exchanges += 1;
        tracing::debug!(command, tx, rx, od = self.od, "simulated exchange");
        Ok(n)
    }

    fn set_valve(&mut self, open: bool) -> Result<(), BoxError> {
        self.valve_open = open;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_with_little_endian_pair() {
        let mut board = SimulatedBoard::new();
        board.write(&[0]).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(board.read(&mut buf).unwrap(), 8);
        let tx = u32::from_le_bytes(buf[..4].try_into().unwrap());
        let rx = u32::from_le_bytes(buf[4..].try_into().unwrap());
        assert_eq!(tx, SIM_TX);
        assert_eq!(rx, 30_000);
    }

    #[test]
    fn no_answer_without_command() {
        let mut board = SimulatedBoard::new();
        let mut buf = [0u8; 8];
        assert_eq!(board.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn silent_board_never_answers() {
        let mut board = SimulatedBoard::new().silent(true);
        board.write(&[10]).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(board.read(&mut buf).unwrap(), 0);
        assert_eq!(board.exchanges(), 0);
    }

    #[test]
    fn full_dilution_lowers_density() {
        let mut board = SimulatedBoard::new().with_od(1.0);
        let mut buf = [0u8; 8];
        board.write(&[255]).unwrap();
        board.read(&mut buf).unwrap();
        assert!(board.od() < 1.0);

        let mut grow = SimulatedBoard::new().with_od(1.0);
        grow.write(&[0]).unwrap();
        grow.read(&mut buf).unwrap();
        assert!(grow.od() > 1.0);
    }

    #[test]
    fn valve_line_tracks_last_state() {
        let mut board = SimulatedBoard::new();
        board.set_valve(true).unwrap();
        assert!(board.valve_open());
        board.set_valve(false).unwrap();
        assert!(!board.valve_open());
    }
}

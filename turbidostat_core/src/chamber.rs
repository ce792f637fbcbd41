//! Chamber driver: one request/response transaction per call.

use tracing::{debug, warn};
use turbidostat_traits::{Clock, Link};

use crate::codec::{FRAME_LEN, decode_reading, encode_command};
use crate::error::{Result, TurbidostatError};
use crate::hw_error::map_link_error;
use crate::types::{Calibration, RawReading};
use crate::util::pulse_duration;

/// Owns the link to the board and the current blank.
pub struct Chamber<L, C> {
    link: L,
    clock: C,
    aux_pulse: bool,
    blank: Option<Calibration>,
}

impl<L: Link, C: Clock> Chamber<L, C> {
    /// Wrap an open link. The auxiliary valve is driven closed.
    pub fn new(mut link: L, clock: C, aux_pulse: bool) -> Self {
        if let Err(e) = link.set_valve(false) {
            warn!(error = %e, "could not close auxiliary valve");
        }
        Self {
            link,
            clock,
            aux_pulse,
            blank: None,
        }
    }

    /// Request a dilution of `period` units and return the board's reading.
    ///
    /// Negative periods are a no-op: no bytes are written and `Ok(None)` is
    /// returned. Periods above 255 are capped. Fewer than eight reply bytes
    /// before the link's timeout is `Timeout`.
    pub fn dilute(&mut self, period: i64) -> Result<Option<RawReading>> {
        let Some(command) = encode_command(period) else {
            debug!(period, "negative dilution period; skipping transaction");
            return Ok(None);
        };
        self.link
            .write(&[command])
            .map_err(|e| map_link_error(&*e))?;

        let mut buf = [0u8; FRAME_LEN];
        let read = self.link.read(&mut buf);

        if self.aux_pulse {
            self.pulse(command);
        }

        let n = read.map_err(|e| map_link_error(&*e))?;
        if n < FRAME_LEN {
            debug!(received = n, "short reply from board");
            return Err(TurbidostatError::Timeout);
        }
        let reading = decode_reading(&buf)?;
        debug!(command, tx = reading.tx, rx = reading.rx, "exchange");
        Ok(Some(reading))
    }

    /// Read the sensor without diluting; the same transaction as `dilute(0)`.
    pub fn read_raw(&mut self) -> Result<RawReading> {
        self.dilute(0)?.ok_or(TurbidostatError::Timeout)
    }

    /// Store `value` as the blank, or read a fresh one when `None`.
    pub fn set_blank(&mut self, value: Option<Calibration>) -> Result<Calibration> {
        let blank = match value {
            Some(v) => v,
            None => self.read_raw()?,
        };
        self.blank = Some(blank);
        Ok(blank)
    }

    pub fn blank(&self) -> Option<Calibration> {
        self.blank
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Hold the auxiliary valve open for a time proportional to `command`.
    /// Timing is approximate.
    fn pulse(&mut self, command: u8) {
        let hold = pulse_duration(command);
        if hold.is_zero() {
            return;
        }
        if let Err(e) = self.link.set_valve(true) {
            warn!(error = %e, "could not open auxiliary valve");
        }
        self.clock.sleep(hold);
        if let Err(e) = self.link.set_valve(false) {
            warn!(error = %e, "could not close auxiliary valve");
        }
    }
}

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};
use turbidostat_traits::{Clock, Link};

use crate::chamber::Chamber;
use crate::config::LoopParams;
use crate::controller::Controller;
use crate::error::{Result, StoreError, TurbidostatError};
use crate::logger::RecordSink;
use crate::od::{FALLBACK_OD, compute_od};
use crate::status::{CycleReport, CycleStatus};
use crate::store::StateStore;
use crate::types::{ControllerState, LogRecord};
use crate::util::sleep_unless_stopped;

/// Resume from the saved state, or capture a fresh blank when there is none.
///
/// Returns the starting integral. Any load failure other than a missing file
/// is logged and treated as a first run. A fresh state is saved right away.
pub fn restore_or_blank<L: Link, C: Clock>(
    chamber: &mut Chamber<L, C>,
    store: &StateStore,
    params: &LoopParams,
) -> Result<f64> {
    match store.load() {
        Ok(state) => {
            chamber.set_blank(Some(state.blank))?;
            info!(
                z = state.z,
                blank_tx = state.blank.tx,
                blank_rx = state.blank.rx,
                "resuming saved state"
            );
            return Ok(state.z);
        }
        Err(StoreError::NotFound) => {
            info!(path = %store.path().display(), "no saved state; capturing fresh blank");
        }
        Err(e) => {
            warn!(error = %e, path = %store.path().display(), "saved state unusable; capturing fresh blank");
        }
    }

    let attempts = params.runtime.blank_retries.max(1);
    for attempt in 1..=attempts {
        match chamber.set_blank(None) {
            Ok(blank) => {
                info!(tx = blank.tx, rx = blank.rx, "blank captured");
                let fresh = ControllerState { z: 0.0, blank };
                if let Err(e) = store.save_with_retry(&fresh, params.runtime.save_retries) {
                    warn!(error = %e, "initial state not saved; will retry next cycle");
                }
                return Ok(0.0);
            }
            Err(e) => warn!(attempt, attempts, error = %e, "blank read failed"),
        }
    }
    Err(TurbidostatError::NoBlank)
}

/// The process-wide control loop: read, estimate, decide, persist, dilute,
/// log, sleep.
pub struct ControlLoop<L, C, S> {
    chamber: Chamber<L, C>,
    controller: Controller,
    store: StateStore,
    sink: S,
    params: LoopParams,
    failed_saves: u32,
}

impl<L: Link, C: Clock, S: RecordSink> ControlLoop<L, C, S> {
    /// Restore or create the controller state and build the loop.
    pub fn start(
        mut chamber: Chamber<L, C>,
        store: StateStore,
        sink: S,
        params: LoopParams,
    ) -> Result<Self> {
        let z = restore_or_blank(&mut chamber, &store, &params)?;
        let controller = Controller::new(&params.control, &params.growth, z);
        info!(
            setpoint = params.control.setpoint,
            kp = params.control.kp,
            ki = params.control.ki,
            period_s = params.control.dilute_period.as_secs(),
            aux_pulse = params.control.use_aux_pulse,
            growth_test = params.control.growth_test_enabled,
            "control loop ready"
        );
        Ok(Self {
            chamber,
            controller,
            store,
            sink,
            params,
            failed_saves: 0,
        })
    }

    pub fn chamber(&self) -> &Chamber<L, C> {
        &self.chamber
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Current recoverable state, once a blank exists.
    pub fn state(&self) -> Option<ControllerState> {
        self.chamber.blank().map(|blank| ControllerState {
            z: self.controller.z(),
            blank,
        })
    }

    /// One control cycle.
    ///
    /// Sensor failures skip the cycle. Only storage failing on
    /// `max_failed_saves` consecutive cycles is returned as an error.
    pub fn step(&mut self) -> Result<CycleStatus> {
        let epoch = self.chamber.clock().epoch();
        let time = self.chamber.clock().epoch_secs();
        let raw = match self.chamber.read_raw() {
            Ok(r) => r,
            Err(e) if e.is_transient() => {
                warn!(error = %e, "sensor read failed; skipping cycle");
                return Ok(CycleStatus::Skipped(e));
            }
            Err(e) => return Err(e),
        };
        let blank = self.chamber.blank().ok_or(TurbidostatError::NoBlank)?;

        let (od, od_fallback) = match compute_od(raw, blank) {
            Ok(od) => (od, false),
            Err(e) => {
                warn!(
                    error = %e,
                    tx = raw.tx,
                    rx = raw.rx,
                    fallback = FALLBACK_OD,
                    "check the hardware is plugged in and working"
                );
                (FALLBACK_OD, true)
            }
        };

        let decision = self.controller.decide(od, epoch);
        let state_saved = if decision.integral_updated {
            self.persist()?
        } else {
            false
        };

        let record = LogRecord {
            time,
            od,
            z: decision.z,
            u: decision.u,
        };

        if let Err(e) = self.chamber.dilute(i64::from(decision.u)) {
            warn!(error = %e, u = decision.u, "no reply to dilution command");
        }
        if let Err(e) = self.sink.emit(&record) {
            error!(error = %e, "data log write failed");
        }
        info!(
            od = record.od,
            z = record.z,
            u = record.u,
            phase = decision.phase.as_str(),
            "cycle"
        );

        Ok(CycleStatus::Completed(CycleReport {
            record,
            phase: decision.phase,
            od_fallback,
            state_saved,
        }))
    }

    /// Run cycles every `dilute_period` until `shutdown` is set or
    /// `max_cycles` have run, then save the state one last time.
    ///
    /// Returns the number of cycles run.
    pub fn run(&mut self, shutdown: &AtomicBool, max_cycles: Option<u64>) -> Result<u64> {
        let mut cycles = 0u64;
        let mut delay = self.params.runtime.startup_delay;
        while !max_cycles.is_some_and(|m| cycles >= m) {
            if !sleep_unless_stopped(self.chamber.clock(), delay, shutdown) {
                break;
            }
            self.step()?;
            cycles += 1;
            delay = self.params.control.dilute_period;
        }
        if shutdown.load(Ordering::Relaxed) {
            info!(cycles, "interrupted; saving state before exit");
        }
        self.flush_state()?;
        Ok(cycles)
    }

    /// Save the current state unconditionally.
    pub fn flush_state(&mut self) -> Result<()> {
        let Some(state) = self.state() else {
            return Ok(());
        };
        self.store
            .save_with_retry(&state, self.params.runtime.save_retries)
            .map_err(TurbidostatError::from)
    }

    /// Save after a normal-mode update. A failed save keeps the in-memory
    /// state; too many consecutive failures abort the loop.
    fn persist(&mut self) -> Result<bool> {
        let Some(state) = self.state() else {
            return Err(TurbidostatError::NoBlank);
        };
        match self
            .store
            .save_with_retry(&state, self.params.runtime.save_retries)
        {
            Ok(()) => {
                self.failed_saves = 0;
                Ok(true)
            }
            Err(e) => {
                self.failed_saves += 1;
                error!(
                    consecutive = self.failed_saves,
                    limit = self.params.runtime.max_failed_saves,
                    z = state.z,
                    "controller state NOT persisted"
                );
                if self.failed_saves >= self.params.runtime.max_failed_saves {
                    return Err(TurbidostatError::Storage(format!(
                        "{} consecutive saves to {} failed: {e}",
                        self.failed_saves,
                        self.store.path().display()
                    )));
                }
                Ok(false)
            }
        }
    }
}

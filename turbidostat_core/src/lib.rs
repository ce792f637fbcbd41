#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core turbidostat control (hardware-agnostic).
//!
//! All board interaction goes through `turbidostat_traits::Link`; time goes
//! through `turbidostat_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Codec**: one command byte out, eight reading bytes back (`codec`)
//! - **Chamber**: transactions, aux valve pulse, blank (`chamber`)
//! - **OD**: log-ratio against the blank (`od`)
//! - **Control**: PI with saturated integral, growth test (`controller`)
//! - **Persistence**: atomic `{z, blank}` record (`store`)
//! - **Loop**: cycle sequencing, sleep, shutdown flush (`runner`)

pub mod chamber;
pub mod codec;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod logger;
pub mod mocks;
pub mod od;
pub mod runner;
pub mod status;
pub mod store;
pub mod types;
pub mod util;

pub use chamber::Chamber;
pub use config::{ControlCfg, GrowthTestCfg, LoopParams, RuntimeCfg};
pub use controller::{Controller, Decision, GrowthTest, PiController};
pub use error::{StoreError, TurbidostatError};
pub use logger::{FileLogger, RecordSink};
pub use runner::{ControlLoop, restore_or_blank};
pub use status::{CycleReport, CycleStatus};
pub use store::StateStore;
pub use types::{Calibration, ControllerState, GrowthPhase, LogRecord, RawReading};

//! Crash-safe persistence of the controller state.
//!
//! The record is replaced atomically: the new content is written to a
//! sibling temp file, synced, and renamed over the old one, so a reader sees
//! either the previous record or the new one, never a mix.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::types::ControllerState;

pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    // Persist the rename itself. Directories cannot be opened for sync on
    // every platform, so this is best-effort.
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Ok(d) = fs::File::open(dir) {
        let _ = d.sync_all();
    }
    Ok(())
}

/// The single persisted `ControllerState` record.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved state. `NotFound` is the normal first-run result.
    pub fn load(&self) -> Result<ControllerState, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let state: ControllerState =
            serde_json::from_str(&text).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if !(0.0..=255.0).contains(&state.z) {
            return Err(StoreError::Corrupt(format!(
                "integral {} outside [0, 255]",
                state.z
            )));
        }
        if state.blank.tx == 0 || state.blank.rx == 0 {
            return Err(StoreError::Corrupt(format!("degenerate blank {}", state.blank)));
        }
        debug!(path = %self.path.display(), z = state.z, "state loaded");
        Ok(state)
    }

    /// Replace the saved state with `state`.
    pub fn save(&self, state: &ControllerState) -> Result<(), StoreError> {
        let json = serde_json::to_vec(state).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        write_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), z = state.z, "state saved");
        Ok(())
    }

    /// `save` with up to `attempts` tries. Every failure is logged; the last
    /// error is returned when all attempts fail.
    pub fn save_with_retry(&self, state: &ControllerState, attempts: u32) -> Result<(), StoreError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.save(state) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(attempt, error = %e, path = %self.path.display(), "state save failed, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempts, error = %e, path = %self.path.display(), z = state.z, "state save failed");
                    return Err(e);
                }
            }
        }
    }
}

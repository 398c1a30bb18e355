//! Simulation backend.
//!
//! Keeps line levels in memory and logs every write.  Always succeeds and
//! reports `connected = false`, so status output makes it obvious that no
//! relay is actually switching.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::info;

use crate::app::ports::PinDriver;
use crate::error::DriverError;
use crate::pins::PinId;

pub const BACKEND: &str = "simulation";

#[derive(Debug, Default)]
pub struct SimulatedDriver {
    levels: Mutex<BTreeMap<PinId, bool>>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level written to `pin`, if any.
    pub fn level(&self, pin: PinId) -> Option<bool> {
        self.lock().get(&pin).copied()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PinId, bool>> {
        self.levels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PinDriver for SimulatedDriver {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn initialize(&self, pins: &[PinId]) -> bool {
        let mut levels = self.lock();
        for &pin in pins {
            levels.insert(pin, false);
        }
        info!("[SIMULATION] {} zone lines initialised", pins.len());
        false
    }

    fn set_level(&self, pin: PinId, on: bool) -> Result<(), DriverError> {
        self.lock().insert(pin, on);
        info!("[SIMULATION] Pin {} set to {}", pin, if on { "ON" } else { "OFF" });
        Ok(())
    }

    fn shutdown_all(&self) {
        for level in self.lock().values_mut() {
            *level = false;
        }
        info!("[SIMULATION] all lines low");
    }
}

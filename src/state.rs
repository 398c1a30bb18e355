//! Zone state store.
//!
//! Authoritative on/off map used for status reporting.  Only pins from the
//! registry ever get an entry; they are all seeded `off` at construction.
//! Legality checks belong to the caller.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::pins::{PinId, PinRegistry};

/// Driver-confirmed logical level of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinState {
    On,
    #[default]
    Off,
}

impl PinState {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl core::fmt::Display for PinState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

pub struct ZoneStateStore {
    states: Mutex<BTreeMap<PinId, PinState>>,
}

impl ZoneStateStore {
    pub fn new(registry: &PinRegistry) -> Self {
        let states = registry
            .list_controllable()
            .iter()
            .map(|&pin| (pin, PinState::Off))
            .collect();
        Self {
            states: Mutex::new(states),
        }
    }

    /// Unseen pins read as `off`.
    pub fn get(&self, pin: PinId) -> PinState {
        self.lock().get(&pin).copied().unwrap_or_default()
    }

    pub fn set(&self, pin: PinId, state: PinState) {
        match self.lock().get_mut(&pin) {
            Some(slot) => *slot = state,
            None => warn!("State store: ignoring write for unregistered pin {pin}"),
        }
    }

    /// Force every zone to `state` (startup seeding and shutdown).
    pub fn set_all(&self, state: PinState) {
        for slot in self.lock().values_mut() {
            *slot = state;
        }
    }

    pub fn snapshot(&self) -> BTreeMap<PinId, PinState> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PinId, PinState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

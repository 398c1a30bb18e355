//! GPIO pin assignments and the zone registry.
//!
//! Single source of truth for which BCM lines drive sprinkler valves and
//! which lines must never be touched.  Zone numbering is positional: the
//! *i*-th controllable pin is "Zone i+1", recomputed on every query.

use heapless::Vec;

use crate::error::ConfigError;

/// BCM line number of a Raspberry Pi header GPIO.
pub type PinId = u8;

/// The 40-pin header exposes BCM lines 0 – 27.
pub const MAX_GPIO_LINES: usize = 28;

// ---------------------------------------------------------------------------
// Default wiring (8-relay boards ×2)
// ---------------------------------------------------------------------------

/// Relay inputs in zone order.
pub const DEFAULT_ZONE_PINS: [PinId; 16] = [12, 16, 20, 21, 26, 19, 13, 6, 5, 11, 9, 10, 22, 27, 17, 4];

/// I²C (2, 3), UART (14, 15) and PCM clock (18).
pub const DEFAULT_DENIED_PINS: [PinId; 5] = [2, 3, 14, 15, 18];

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable controllable/denied tables built once from configuration.
///
/// The denied set is checked independently of the controllable set and
/// may name pins that are not zones at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRegistry {
    controllable: Vec<PinId, MAX_GPIO_LINES>,
    denied: Vec<PinId, MAX_GPIO_LINES>,
}

impl PinRegistry {
    pub fn new(controllable: &[PinId], denied: &[PinId]) -> Result<Self, ConfigError> {
        if controllable.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "controllable pin list is empty".into(),
            ));
        }
        Ok(Self {
            controllable: build_table("controllable", controllable)?,
            denied: build_table("denied", denied)?,
        })
    }

    pub fn is_controllable(&self, pin: PinId) -> bool {
        self.controllable.contains(&pin)
    }

    pub fn is_denied(&self, pin: PinId) -> bool {
        self.denied.contains(&pin)
    }

    /// Controllable pins in zone order.
    pub fn list_controllable(&self) -> &[PinId] {
        &self.controllable
    }

    pub fn list_denied(&self) -> &[PinId] {
        &self.denied
    }

    /// 1-based zone number of `pin`, if it is controllable.
    pub fn zone_index(&self, pin: PinId) -> Option<usize> {
        self.controllable.iter().position(|&p| p == pin).map(|i| i + 1)
    }

    pub fn zone_name(&self, pin: PinId) -> Option<String> {
        self.zone_index(pin).map(|n| format!("Zone {n}"))
    }
}

impl Default for PinRegistry {
    fn default() -> Self {
        Self::new(&DEFAULT_ZONE_PINS, &DEFAULT_DENIED_PINS)
            .unwrap_or_else(|e| unreachable!("built-in pin tables rejected: {e}"))
    }
}

fn build_table(name: &str, pins: &[PinId]) -> Result<Vec<PinId, MAX_GPIO_LINES>, ConfigError> {
    let mut table: Vec<PinId, MAX_GPIO_LINES> = Vec::new();
    for &pin in pins {
        if usize::from(pin) >= MAX_GPIO_LINES {
            return Err(ConfigError::ValidationFailed(format!(
                "{name} pin {pin} is not a header GPIO (0-{})",
                MAX_GPIO_LINES - 1
            )));
        }
        if table.contains(&pin) {
            return Err(ConfigError::ValidationFailed(format!(
                "{name} pin {pin} listed twice"
            )));
        }
        table.push(pin).map_err(|_| {
            ConfigError::ValidationFailed(format!("{name} pin list exceeds {MAX_GPIO_LINES} entries"))
        })?;
    }
    Ok(table)
}

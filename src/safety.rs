//! Activation interlock and run-time policy.
//!
//! Two rules sit in front of every valve activation:
//!
//! 1. The pin must be a configured zone, and must not be on the denylist.
//!    Unknown pins are reported before denied ones.
//! 2. The requested run time is normalised: absent or non-positive values
//!    fall back to the default, and an optional cap bounds the rest.
//!
//! Turning a zone *off* is never gated by the denylist.

use log::warn;

use crate::error::ControlError;
use crate::pins::{PinId, PinRegistry};

/// Default auto-off delay when the caller gives none.
pub const DEFAULT_RUN_MINUTES: u32 = 10;

/// Reject activation of unknown or denied pins.  Returns the 1-based zone
/// number of an accepted pin.
pub fn check_activation(registry: &PinRegistry, pin: PinId) -> Result<usize, ControlError> {
    let zone = registry.zone_index(pin).ok_or(ControlError::NotFound(pin))?;
    if registry.is_denied(pin) {
        return Err(ControlError::Forbidden(pin));
    }
    Ok(zone)
}

/// Reject deactivation of unknown pins.  Denied pins may always be turned off.
pub fn check_deactivation(registry: &PinRegistry, pin: PinId) -> Result<(), ControlError> {
    if registry.is_controllable(pin) {
        Ok(())
    } else {
        Err(ControlError::NotFound(pin))
    }
}

/// Auto-off duration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationPolicy {
    default_minutes: u32,
    max_minutes: Option<u32>,
}

impl DurationPolicy {
    /// `default_minutes` must be non-zero; a zero default is bumped to one
    /// minute so that every activation stays time-bounded.
    pub fn new(default_minutes: u32, max_minutes: Option<u32>) -> Self {
        Self {
            default_minutes: default_minutes.max(1),
            max_minutes: max_minutes.map(|m| m.max(1)),
        }
    }

    pub fn max_minutes(&self) -> Option<u32> {
        self.max_minutes
    }

    /// Effective run time for a requested duration.
    pub fn normalize(&self, requested: Option<i64>) -> u32 {
        let minutes = match requested {
            Some(m) if m > 0 => u32::try_from(m).unwrap_or(u32::MAX),
            _ => self.default_minutes,
        };
        match self.max_minutes {
            Some(cap) if minutes > cap => {
                warn!("Requested run of {minutes} min exceeds cap, clamped to {cap} min");
                cap
            }
            _ => minutes,
        }
    }
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RUN_MINUTES, None)
    }
}

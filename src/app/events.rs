//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) emits these
//! through the [`EventSink`](super::ports::EventSink) port after every
//! accepted state change.  Adapters decide what to do with them.

use crate::error::DriverError;
use crate::pins::PinId;

/// Why a zone went off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffReason {
    /// An explicit deactivate request.
    Manual,
    /// The zone's auto-off timer fired.
    AutoOff,
    /// Part of an emergency-stop sweep.
    EmergencyStop,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneEvent {
    /// The driver was initialised and every zone seeded off.
    Started {
        backend: &'static str,
        connected: bool,
        zones: usize,
    },

    /// A zone was energised with an auto-off after `minutes`.
    Activated { pin: PinId, zone: usize, minutes: u32 },

    /// A zone was de-energised.
    Deactivated { pin: PinId, reason: OffReason },

    /// The driver rejected a write; `on` is the level that was requested.
    DriverFault { pin: PinId, on: bool, error: DriverError },

    /// Emergency stop completed.
    EmergencyStop {
        stopped: Vec<PinId>,
        timers_cancelled: Vec<PinId>,
    },

    /// All timers cancelled and the driver released.
    Shutdown,
}

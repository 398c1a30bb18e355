//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (GPIO backends, event sinks) implement these traits.
//! The [`ControlService`](super::service::ControlService) holds them as
//! shared trait objects because timer tasks call back into the service
//! from outside any request.

use crate::error::DriverError;
use crate::pins::PinId;

use super::events::ZoneEvent;

// ───────────────────────────────────────────────────────────────
// Pin driver port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to switch valve relays.
///
/// Calls for distinct pins may arrive concurrently.  Calls for the same
/// pin are serialised by the service.
pub trait PinDriver: Send + Sync {
    /// Short backend name for status reporting (e.g. `"gpio-cdev"`).
    fn backend(&self) -> &'static str;

    /// Configure `pins` as outputs driven low.  Returns whether real
    /// hardware is connected.
    fn initialize(&self, pins: &[PinId]) -> bool;

    /// Drive `pin` high (`on = true`) or low.
    fn set_level(&self, pin: PinId, on: bool) -> Result<(), DriverError>;

    /// Drive every configured line low and release the hardware.
    fn shutdown_all(&self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`ZoneEvent`]s through this port.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ZoneEvent);
}

//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured zone events to the `log`
//! facade (a tracing-subscriber fmt layer in production).  A future MQTT or
//! webhook adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::{OffReason, ZoneEvent};
use crate::app::ports::EventSink;

/// Adapter that logs every [`ZoneEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &ZoneEvent) {
        match event {
            ZoneEvent::Started {
                backend,
                connected,
                zones,
            } => {
                info!("START | backend={} connected={} zones={}", backend, connected, zones);
            }
            ZoneEvent::Activated { pin, zone, minutes } => {
                info!("ZONE  | zone {} (pin {}) ON, auto-off in {} min", zone, pin, minutes);
            }
            ZoneEvent::Deactivated { pin, reason } => {
                let why = match reason {
                    OffReason::Manual => "manual",
                    OffReason::AutoOff => "auto-off",
                    OffReason::EmergencyStop => "emergency stop",
                };
                info!("ZONE  | pin {} OFF ({})", pin, why);
            }
            ZoneEvent::DriverFault { pin, on, error } => {
                warn!(
                    "FAULT | pin {} {} rejected: {}",
                    pin,
                    if *on { "ON" } else { "OFF" },
                    error
                );
            }
            ZoneEvent::EmergencyStop {
                stopped,
                timers_cancelled,
            } => {
                warn!(
                    "ESTOP | stopped={:?} timers_cancelled={:?}",
                    stopped, timers_cancelled
                );
            }
            ZoneEvent::Shutdown => info!("STOP  | all zones off"),
        }
    }
}

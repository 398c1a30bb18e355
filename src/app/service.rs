//! Control service: the hexagonal core.
//!
//! [`ControlService`] owns the zone state store and the auto-off timer
//! coordinator, and drives the relay backend through the
//! [`PinDriver`] port.
//!
//! ```text
//!  Gateway ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!              │        ControlService         │
//!              │ Registry · Store · Timers     │
//!  PinDriver ◀─│   (one lane lock per pin)     │ ◀── auto-off fire
//!              └──────────────────────────────┘
//! ```
//!
//! Every operation on a pin (API call or timer fire) runs under that
//! pin's lane lock, so the driver write, the state update and the
//! schedule change for one pin are linearised.  Distinct pins never
//! contend.  Lock order is lane → schedule map.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::error::{ControlError, DriverError, Result};
use crate::pins::{PinId, PinRegistry};
use crate::safety::{DurationPolicy, check_activation, check_deactivation};
use crate::scheduler::{Expiry, TimerCoordinator, TimerSnapshot};
use crate::state::{PinState, ZoneStateStore};

use super::events::{OffReason, ZoneEvent};
use super::ports::{EventSink, PinDriver};

// ───────────────────────────────────────────────────────────────
// Read models
// ───────────────────────────────────────────────────────────────

/// Result of a successful activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub pin: PinId,
    pub zone: usize,
    /// Effective auto-off delay after normalisation.
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneStatus {
    pub id: PinId,
    pub name: String,
    pub enabled: bool,
    pub state: PinState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinStatus {
    pub pin: PinId,
    pub state: PinState,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub controllable: Vec<PinId>,
    pub denied: Vec<PinId>,
    pub backend: &'static str,
    pub connected: bool,
    pub zones: Vec<ZoneStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmergencyStopReport {
    /// Zones that were on and are now confirmed off.
    pub stopped: Vec<PinId>,
    /// Pins that had a live auto-off at the start of the sweep.
    pub timers_cancelled: Vec<PinId>,
}

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

/// Cheap to clone; clones share the same zones.
#[derive(Clone)]
pub struct ControlService {
    inner: Arc<Inner>,
}

struct Inner {
    registry: PinRegistry,
    policy: DurationPolicy,
    driver: Arc<dyn PinDriver>,
    sink: Arc<dyn EventSink>,
    store: ZoneStateStore,
    timers: TimerCoordinator,
    lanes: BTreeMap<PinId, Mutex<()>>,
    connected: AtomicBool,
}

impl ControlService {
    /// Build the service.  Call [`initialize`](Self::initialize) before
    /// serving requests.
    pub fn new(
        registry: PinRegistry,
        policy: DurationPolicy,
        driver: Arc<dyn PinDriver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let store = ZoneStateStore::new(&registry);
        let lanes = registry
            .list_controllable()
            .iter()
            .map(|&pin| (pin, Mutex::new(())))
            .collect();
        Self {
            inner: Arc::new(Inner {
                registry,
                policy,
                driver,
                sink,
                store,
                timers: TimerCoordinator::new(),
                lanes,
                connected: AtomicBool::new(false),
            }),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Configure every zone line as an output, low.  Returns the
    /// driver's connected flag.
    pub fn initialize(&self) -> bool {
        let inner = &self.inner;
        let pins = inner.registry.list_controllable();
        let connected = inner.driver.initialize(pins);
        inner.store.set_all(PinState::Off);
        inner.connected.store(connected, Ordering::SeqCst);
        info!(
            "GPIO initialised: backend={} connected={} zones={:?}",
            inner.driver.backend(),
            connected,
            pins
        );
        inner.sink.emit(&ZoneEvent::Started {
            backend: inner.driver.backend(),
            connected,
            zones: pins.len(),
        });
        connected
    }

    /// Cancel every timer, drive every line low and release the driver.
    pub fn shutdown(&self) {
        let inner = &self.inner;
        inner.timers.cancel_all();
        inner.driver.shutdown_all();
        inner.store.set_all(PinState::Off);
        inner.connected.store(false, Ordering::SeqCst);
        info!("Control service stopped");
        inner.sink.emit(&ZoneEvent::Shutdown);
    }

    // ── Commands ──────────────────────────────────────────────

    /// Turn a zone on with an auto-off after the normalised duration.
    ///
    /// A previous auto-off for the same zone is replaced, not extended.
    /// On driver failure nothing is recorded and the old timer (if any)
    /// keeps running.
    pub fn activate(&self, pin: PinId, requested_minutes: Option<i64>) -> Result<Activation> {
        let inner = &self.inner;
        let zone = check_activation(&inner.registry, pin)?;
        let minutes = inner.policy.normalize(requested_minutes);

        let _lane = inner.lane(pin)?;
        if let Err(e) = inner.driver.set_level(pin, true) {
            inner.report_fault(pin, true, &e);
            return Err(e.into());
        }
        inner.store.set(pin, PinState::On);

        let service = Arc::downgrade(&self.inner);
        inner.timers.schedule(pin, minutes, move |expiry| auto_off(&service, expiry));

        info!("Pin {} turned on for {} minutes", pin, minutes);
        inner.sink.emit(&ZoneEvent::Activated { pin, zone, minutes });
        Ok(Activation { pin, zone, minutes })
    }

    /// Turn a zone off and cancel its auto-off.  Denied pins may always
    /// be turned off.
    ///
    /// A zone already confirmed off with no pending timer is left alone,
    /// so a deactivate racing its own auto-off writes the line once.
    pub fn deactivate(&self, pin: PinId) -> Result<()> {
        let inner = &self.inner;
        check_deactivation(&inner.registry, pin)?;

        let _lane = inner.lane(pin)?;
        let had_timer = inner.timers.cancel(pin);
        if !had_timer && !inner.store.get(pin).is_on() {
            debug!("Pin {} already off", pin);
            return Ok(());
        }
        if let Err(e) = inner.driver.set_level(pin, false) {
            inner.report_fault(pin, false, &e);
            return Err(e.into());
        }
        inner.store.set(pin, PinState::Off);
        info!("Pin {} turned off", pin);
        inner.sink.emit(&ZoneEvent::Deactivated {
            pin,
            reason: OffReason::Manual,
        });
        Ok(())
    }

    /// Cancel every timer and turn off every zone that is on.
    ///
    /// Never fails: a driver error on one zone is logged and the sweep
    /// moves on.  That zone keeps its last confirmed state.
    pub fn emergency_stop(&self) -> EmergencyStopReport {
        let inner = &self.inner;
        let timers_cancelled = inner.timers.cancel_all();

        let outcomes: Vec<(PinId, core::result::Result<(), DriverError>)> = inner
            .registry
            .list_controllable()
            .iter()
            .filter_map(|&pin| inner.stop_zone(pin).map(|outcome| (pin, outcome)))
            .collect();

        let stopped: Vec<PinId> = outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_ok())
            .map(|(pin, _)| *pin)
            .collect();
        let failed = outcomes.len() - stopped.len();
        if failed > 0 {
            warn!("Emergency stop: {} zone(s) could not be turned off", failed);
        }
        info!("Emergency stop: {} pins turned off", stopped.len());

        let report = EmergencyStopReport {
            stopped,
            timers_cancelled,
        };
        inner.sink.emit(&ZoneEvent::EmergencyStop {
            stopped: report.stopped.clone(),
            timers_cancelled: report.timers_cancelled.clone(),
        });
        report
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> StatusReport {
        let inner = &self.inner;
        StatusReport {
            controllable: inner.registry.list_controllable().to_vec(),
            denied: inner.registry.list_denied().to_vec(),
            backend: inner.driver.backend(),
            connected: self.is_connected(),
            zones: self.zones(),
        }
    }

    /// Per-zone view in zone order.
    pub fn zones(&self) -> Vec<ZoneStatus> {
        let inner = &self.inner;
        let states = inner.store.snapshot();
        inner
            .registry
            .list_controllable()
            .iter()
            .map(|&pin| ZoneStatus {
                id: pin,
                name: inner.registry.zone_name(pin).unwrap_or_default(),
                enabled: !inner.registry.is_denied(pin),
                state: states.get(&pin).copied().unwrap_or_default(),
            })
            .collect()
    }

    pub fn pin_status(&self, pin: PinId) -> Result<PinStatus> {
        let inner = &self.inner;
        if !inner.registry.is_controllable(pin) {
            return Err(ControlError::NotFound(pin));
        }
        Ok(PinStatus {
            pin,
            state: inner.store.get(pin),
            enabled: !inner.registry.is_denied(pin),
        })
    }

    pub fn timers(&self) -> BTreeMap<PinId, TimerSnapshot> {
        self.inner.timers.snapshot()
    }

    pub fn live_timers(&self) -> usize {
        self.inner.timers.live_count()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }
}

// ───────────────────────────────────────────────────────────────
// Internal
// ───────────────────────────────────────────────────────────────

impl Inner {
    fn lane(&self, pin: PinId) -> Result<MutexGuard<'_, ()>> {
        self.lanes
            .get(&pin)
            .map(|lane| lane.lock().unwrap_or_else(PoisonError::into_inner))
            .ok_or(ControlError::NotFound(pin))
    }

    /// One step of the emergency sweep.  `None` if the zone was not on.
    fn stop_zone(&self, pin: PinId) -> Option<core::result::Result<(), DriverError>> {
        let _lane = self.lane(pin).ok()?;
        // An activate that slipped in after cancel_all() must not keep its timer.
        if self.timers.cancel(pin) {
            debug!("Emergency stop: cancelled late timer for pin {}", pin);
        }
        if !self.store.get(pin).is_on() {
            return None;
        }
        match self.driver.set_level(pin, false) {
            Ok(()) => {
                self.store.set(pin, PinState::Off);
                self.sink.emit(&ZoneEvent::Deactivated {
                    pin,
                    reason: OffReason::EmergencyStop,
                });
                Some(Ok(()))
            }
            Err(e) => {
                self.report_fault(pin, false, &e);
                Some(Err(e))
            }
        }
    }

    /// Timer-fired deactivation.  Driver failures are logged, not raised.
    fn deactivate_quiet(&self, expiry: Expiry) {
        let (pin, id) = (expiry.pin(), expiry.id());
        let Ok(_lane) = self.lane(pin) else {
            return;
        };
        if !expiry.retire() {
            debug!("Auto-off #{} for pin {} superseded", id, pin);
            return;
        }
        match self.driver.set_level(pin, false) {
            Ok(()) => {
                self.store.set(pin, PinState::Off);
                info!("Auto-off: pin {} turned off", pin);
                self.sink.emit(&ZoneEvent::Deactivated {
                    pin,
                    reason: OffReason::AutoOff,
                });
            }
            Err(e) => self.report_fault(pin, false, &e),
        }
    }

    fn report_fault(&self, pin: PinId, on: bool, e: &DriverError) {
        error!(
            "Failed to set pin {} {}: {}",
            pin,
            if on { "ON" } else { "OFF" },
            e
        );
        self.sink.emit(&ZoneEvent::DriverFault {
            pin,
            on,
            error: e.clone(),
        });
    }
}

fn auto_off(service: &Weak<Inner>, expiry: Expiry) {
    // Service gone: dropping the ticket retires the schedule.
    if let Some(inner) = service.upgrade() {
        inner.deactivate_quiet(expiry);
    }
}

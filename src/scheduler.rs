//! Auto-off timer coordinator.
//!
//! Every activation installs one deferred deactivation for its pin.  The
//! coordinator keeps **at most one live schedule per pin**: installing a
//! new one first retires the old one under the same lock, so there is no
//! instant where both could fire.
//!
//! ```text
//!   schedule(pin) ──▶ ┌──────────────────────┐
//!   cancel(pin)   ──▶ │  Mutex<Schedules>     │ ◀── Expiry::retire()
//!   cancel_all()  ──▶ │  pin → LiveSchedule   │       (fired task)
//!                     └──────────────────────┘
//! ```
//!
//! A schedule is a tokio task sleeping until its deadline.  When it wakes
//! it hands an [`Expiry`] ticket to the fire callback.  The ticket wins
//! only if its id is still the live schedule for the pin; a concurrent
//! `cancel` that got there first makes `retire()` return `false`.  Either
//! the cancel or the fire takes effect, never both.  The cancellation
//! handle ([`AbortHandle`]) only stops the sleeping task early; the id
//! check is what makes the outcome exact.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::pins::PinId;

/// Unique id of one installed schedule.
pub type ScheduleId = u64;

/// Deadlines past this horizon are treated as "practically never".
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 3600);

/// Debug view of one pin's timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    /// A schedule is installed and has not fired or been cancelled.
    pub active: bool,
    /// The last schedule for this pin was cancelled explicitly.
    pub cancelled: bool,
    /// Seconds until the auto-off fires (0 when inactive).
    pub remaining_secs: u64,
}

#[derive(Debug)]
struct LiveSchedule {
    id: ScheduleId,
    deadline: Instant,
    task: AbortHandle,
}

#[derive(Debug, Default)]
struct Schedules {
    live: HashMap<PinId, LiveSchedule>,
    /// One record per pin, cleared on the next install.
    cancelled: BTreeSet<PinId>,
    next_id: ScheduleId,
}

/// Owner of every pending auto-off.
#[derive(Debug, Clone, Default)]
pub struct TimerCoordinator {
    schedules: Arc<Mutex<Schedules>>,
}

impl TimerCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an auto-off for `pin` after `minutes`, replacing any
    /// existing one.  Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, pin: PinId, minutes: u32, on_fire: F) -> ScheduleId
    where
        F: FnOnce(Expiry) + Send + 'static,
    {
        self.schedule_after(pin, Duration::from_secs(u64::from(minutes) * 60), on_fire)
    }

    /// Like [`schedule`](Self::schedule) with an arbitrary delay.
    pub fn schedule_after<F>(&self, pin: PinId, delay: Duration, on_fire: F) -> ScheduleId
    where
        F: FnOnce(Expiry) + Send + 'static,
    {
        let now = Instant::now();
        let deadline = now
            .checked_add(delay)
            .unwrap_or_else(|| now + FAR_FUTURE);

        let (id, replaced) = {
            let mut s = lock(&self.schedules);
            s.next_id += 1;
            let id = s.next_id;
            let replaced = s.live.remove(&pin);
            s.cancelled.remove(&pin);

            let expiry = Expiry {
                pin,
                id,
                schedules: Arc::clone(&self.schedules),
                retired: false,
            };
            let task = tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                on_fire(expiry);
            });
            s.live.insert(
                pin,
                LiveSchedule {
                    id,
                    deadline,
                    task: task.abort_handle(),
                },
            );
            (id, replaced)
        };

        if let Some(old) = replaced {
            old.task.abort();
            debug!("Timer: pin {} schedule #{} replaced by #{}", pin, old.id, id);
        }
        debug!("Timer: pin {} auto-off #{} in {}s", pin, id, delay.as_secs());
        id
    }

    /// Stop the pending fire for `pin`.  Returns `false` if none was live.
    pub fn cancel(&self, pin: PinId) -> bool {
        let removed = {
            let mut s = lock(&self.schedules);
            let removed = s.live.remove(&pin);
            if removed.is_some() {
                s.cancelled.insert(pin);
            }
            removed
        };
        match removed {
            Some(old) => {
                old.task.abort();
                info!("Auto-off timer for pin {} was cancelled", pin);
                true
            }
            None => false,
        }
    }

    /// Cancel every live schedule.  Returns the affected pins, sorted.
    pub fn cancel_all(&self) -> Vec<PinId> {
        let drained: Vec<(PinId, LiveSchedule)> = {
            let mut s = lock(&self.schedules);
            let drained: Vec<_> = s.live.drain().collect();
            for (pin, _) in &drained {
                s.cancelled.insert(*pin);
            }
            drained
        };
        let mut pins: Vec<PinId> = drained
            .into_iter()
            .map(|(pin, live)| {
                live.task.abort();
                pin
            })
            .collect();
        pins.sort_unstable();
        if !pins.is_empty() {
            info!("Timer: cancelled auto-off for pins {:?}", pins);
        }
        pins
    }

    pub fn is_live(&self, pin: PinId) -> bool {
        lock(&self.schedules).live.contains_key(&pin)
    }

    pub fn live_count(&self) -> usize {
        lock(&self.schedules).live.len()
    }

    pub fn snapshot(&self) -> BTreeMap<PinId, TimerSnapshot> {
        let s = lock(&self.schedules);
        let now = Instant::now();
        let mut out: BTreeMap<PinId, TimerSnapshot> = s
            .cancelled
            .iter()
            .map(|&pin| {
                (
                    pin,
                    TimerSnapshot {
                        active: false,
                        cancelled: true,
                        remaining_secs: 0,
                    },
                )
            })
            .collect();
        for (&pin, live) in &s.live {
            out.insert(
                pin,
                TimerSnapshot {
                    active: true,
                    cancelled: false,
                    remaining_secs: live.deadline.saturating_duration_since(now).as_secs(),
                },
            );
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════
//  Expiry ticket
// ═══════════════════════════════════════════════════════════════

/// Handed to the fire callback when a schedule's deadline passes.
///
/// Dropping the ticket without calling [`retire`](Self::retire) still
/// removes the schedule, so a fired timer never lingers in the map.
#[derive(Debug)]
pub struct Expiry {
    pin: PinId,
    id: ScheduleId,
    schedules: Arc<Mutex<Schedules>>,
    retired: bool,
}

impl Expiry {
    pub fn pin(&self) -> PinId {
        self.pin
    }

    pub fn id(&self) -> ScheduleId {
        self.id
    }

    /// Remove this schedule if it is still the live one for its pin.
    ///
    /// `true` means the fire won and the caller must perform the
    /// deactivation; `false` means it was cancelled or replaced.
    pub fn retire(mut self) -> bool {
        self.retired = true;
        retire_entry(&self.schedules, self.pin, self.id)
    }
}

impl Drop for Expiry {
    fn drop(&mut self) {
        if !self.retired {
            retire_entry(&self.schedules, self.pin, self.id);
        }
    }
}

fn retire_entry(schedules: &Mutex<Schedules>, pin: PinId, id: ScheduleId) -> bool {
    let mut s = lock(schedules);
    match s.live.get(&pin) {
        Some(live) if live.id == id => {
            s.live.remove(&pin);
            true
        }
        _ => false,
    }
}

fn lock(schedules: &Mutex<Schedules>) -> MutexGuard<'_, Schedules> {
    schedules.lock().unwrap_or_else(PoisonError::into_inner)
}

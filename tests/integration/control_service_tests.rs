//! Integration tests for `ControlService` against the mock driver.
//!
//! Auto-off timing runs on tokio's paused clock, so a ten-minute
//! schedule completes instantly and deterministically.

use std::time::Duration;

use sprinkler::app::events::{OffReason, ZoneEvent};
use sprinkler::error::{ControlError, DriverError};
use sprinkler::safety::DurationPolicy;
use sprinkler::state::PinState;

use crate::mock_driver::{DriverCall, ZONES, harness, harness_with, timer_active};

const MINUTE: Duration = Duration::from_secs(60);

async fn advance(d: Duration) {
    tokio::time::sleep(d).await;
}

// ── Startup and status ────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn status_after_initialize() {
    let h = harness();
    let report = h.service.status();

    assert_eq!(report.controllable, ZONES.to_vec());
    assert_eq!(report.denied, vec![2, 19]);
    assert_eq!(report.backend, "mock");
    assert!(report.connected);
    assert!(report.zones.iter().all(|z| z.state == PinState::Off));
    assert_eq!(report.zones[0].name, "Zone 1");
    assert!(!report.zones[3].enabled, "denied zone 19 must be disabled");
    assert_eq!(h.driver.calls()[0], DriverCall::Initialize(ZONES.to_vec()));
    assert_eq!(h.service.live_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn disconnected_driver_is_reported() {
    let h = harness_with(false, DurationPolicy::default());
    assert!(!h.service.is_connected());
    assert!(!h.service.status().connected);
    assert!(matches!(
        h.sink.events()[0],
        ZoneEvent::Started { connected: false, zones: 4, .. }
    ));
}

// ── Legality ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn pins_outside_registry_are_not_found() {
    let h = harness();
    for pin in [0u8, 2, 7, 27, 200] {
        assert_eq!(h.service.activate(pin, Some(5)), Err(ControlError::NotFound(pin)));
        assert_eq!(h.service.deactivate(pin), Err(ControlError::NotFound(pin)));
        assert_eq!(h.service.pin_status(pin), Err(ControlError::NotFound(pin)));
    }
    assert_eq!(h.driver.total_writes(), 0);
}

#[tokio::test(start_paused = true)]
async fn denied_zone_cannot_start_but_can_stop() {
    let h = harness();
    assert_eq!(h.service.activate(19, None), Err(ControlError::Forbidden(19)));
    assert_eq!(h.service.pin_status(19).unwrap().state, PinState::Off);
    assert_eq!(h.service.live_timers(), 0);
    assert_eq!(h.service.deactivate(19), Ok(()));
    assert_eq!(h.driver.writes(19, true), 0);
}

// ── Activate / deactivate ─────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn round_trip_on_then_off() {
    let h = harness();
    let activation = h.service.activate(6, Some(5)).unwrap();
    assert_eq!(activation.zone, 2);
    assert_eq!(activation.minutes, 5);
    assert_eq!(h.service.pin_status(6).unwrap().state, PinState::On);
    assert!(timer_active(&h.service, 6));

    h.service.deactivate(6).unwrap();
    assert_eq!(h.service.pin_status(6).unwrap().state, PinState::Off);
    let timer = h.service.timers()[&6];
    assert!(!timer.active);
    assert!(timer.cancelled);

    // Nothing else fires later.
    advance(10 * MINUTE).await;
    assert_eq!(h.driver.writes(6, false), 1);
    assert!(h.sink.events().contains(&ZoneEvent::Deactivated {
        pin: 6,
        reason: OffReason::Manual
    }));
}

#[tokio::test(start_paused = true)]
async fn missing_or_invalid_duration_uses_default() {
    let h = harness();
    assert_eq!(h.service.activate(5, None).unwrap().minutes, 10);
    assert_eq!(h.service.activate(6, Some(0)).unwrap().minutes, 10);
    assert_eq!(h.service.activate(13, Some(-30)).unwrap().minutes, 10);
    assert_eq!(h.service.timers()[&13].remaining_secs, 600);
}

#[tokio::test(start_paused = true)]
async fn configured_cap_clamps_duration() {
    let h = harness_with(true, DurationPolicy::new(10, Some(30)));
    assert_eq!(h.service.activate(5, Some(90)).unwrap().minutes, 30);
    assert_eq!(h.service.timers()[&5].remaining_secs, 30 * 60);
}

#[tokio::test(start_paused = true)]
async fn auto_off_turns_zone_off_and_clears_schedule() {
    let h = harness();
    h.service.activate(5, Some(3)).unwrap();

    advance(3 * MINUTE - Duration::from_secs(1)).await;
    assert_eq!(h.service.pin_status(5).unwrap().state, PinState::On);

    advance(Duration::from_secs(2)).await;
    assert_eq!(h.service.pin_status(5).unwrap().state, PinState::Off);
    assert_eq!(h.service.live_timers(), 0);
    assert!(!timer_active(&h.service, 5));
    assert_eq!(h.driver.writes(5, false), 1);
    assert!(h.sink.events().contains(&ZoneEvent::Deactivated {
        pin: 5,
        reason: OffReason::AutoOff
    }));
}

#[tokio::test(start_paused = true)]
async fn reactivation_replaces_previous_timer() {
    let h = harness();
    h.service.activate(5, Some(2)).unwrap();
    advance(MINUTE).await;
    h.service.activate(5, Some(5)).unwrap();
    assert_eq!(h.service.live_timers(), 1);
    assert_eq!(h.service.timers()[&5].remaining_secs, 300);

    // The first schedule's deadline passes without effect.
    advance(2 * MINUTE).await;
    assert_eq!(h.service.pin_status(5).unwrap().state, PinState::On);
    assert_eq!(h.driver.writes(5, false), 0);

    // The second fires at its own deadline, five minutes after it was set.
    advance(3 * MINUTE + Duration::from_secs(1)).await;
    assert_eq!(h.service.pin_status(5).unwrap().state, PinState::Off);
    assert_eq!(h.driver.writes(5, false), 1);
    assert_eq!(h.service.live_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn deactivate_at_fire_instant_writes_off_once() {
    let h = harness();
    h.service.activate(13, Some(1)).unwrap();

    advance(MINUTE).await;
    h.service.deactivate(13).unwrap();
    tokio::task::yield_now().await;
    advance(MINUTE).await;

    assert_eq!(h.driver.writes(13, false), 1);
    assert_eq!(h.service.pin_status(13).unwrap().state, PinState::Off);
    assert_eq!(h.service.live_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn deactivate_after_auto_off_is_quiet() {
    let h = harness();
    h.service.activate(13, Some(1)).unwrap();
    advance(2 * MINUTE).await;
    assert_eq!(h.service.deactivate(13), Ok(()));
    assert_eq!(h.driver.writes(13, false), 1);
}

// ── Driver failures ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn failed_activation_leaves_state_and_timers_untouched() {
    let h = harness();
    h.driver.fail_pin(6);

    let err = h.service.activate(6, Some(5)).unwrap_err();
    assert!(matches!(err, ControlError::Driver(DriverError::WriteFailed { pin: 6, .. })));
    assert_eq!(h.service.pin_status(6).unwrap().state, PinState::Off);
    assert_eq!(h.service.live_timers(), 0);
    assert!(h
        .sink
        .events()
        .iter()
        .any(|e| matches!(e, ZoneEvent::DriverFault { pin: 6, on: true, .. })));
}

#[tokio::test(start_paused = true)]
async fn failed_reactivation_keeps_old_timer() {
    let h = harness();
    h.service.activate(6, Some(5)).unwrap();
    advance(MINUTE).await;

    h.driver.fail_pin(6);
    assert!(h.service.activate(6, Some(30)).is_err());
    assert_eq!(h.service.timers()[&6].remaining_secs, 240);

    h.driver.heal_pin(6);
    advance(4 * MINUTE + Duration::from_secs(1)).await;
    assert_eq!(h.service.pin_status(6).unwrap().state, PinState::Off);
}

#[tokio::test(start_paused = true)]
async fn failed_deactivation_keeps_zone_on() {
    let h = harness();
    h.service.activate(5, Some(5)).unwrap();
    h.driver.fail_pin(5);

    assert!(matches!(h.service.deactivate(5), Err(ControlError::Driver(_))));
    assert_eq!(h.service.pin_status(5).unwrap().state, PinState::On);
    assert_eq!(h.service.live_timers(), 0);

    h.driver.heal_pin(5);
    h.service.deactivate(5).unwrap();
    assert_eq!(h.service.pin_status(5).unwrap().state, PinState::Off);
}

#[tokio::test(start_paused = true)]
async fn failed_auto_off_is_logged_and_retires_schedule() {
    let h = harness();
    h.service.activate(5, Some(1)).unwrap();
    h.driver.fail_pin(5);

    advance(MINUTE + Duration::from_secs(1)).await;
    assert_eq!(h.service.pin_status(5).unwrap().state, PinState::On);
    assert_eq!(h.service.live_timers(), 0);
    assert!(h
        .sink
        .events()
        .iter()
        .any(|e| matches!(e, ZoneEvent::DriverFault { pin: 5, on: false, .. })));
}

// ── Emergency stop ────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn emergency_stop_turns_everything_off() {
    let h = harness();
    for pin in [5, 6, 13] {
        h.service.activate(pin, Some(10)).unwrap();
    }

    let report = h.service.emergency_stop();
    assert_eq!(report.stopped, vec![5, 6, 13]);
    assert_eq!(report.timers_cancelled, vec![5, 6, 13]);
    assert_eq!(h.service.live_timers(), 0);
    assert!(h.service.zones().iter().all(|z| z.state == PinState::Off));

    advance(20 * MINUTE).await;
    for pin in [5, 6, 13] {
        assert_eq!(h.driver.writes(pin, false), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn emergency_stop_continues_past_a_failing_zone() {
    let h = harness();
    for pin in [5, 6, 13] {
        h.service.activate(pin, Some(10)).unwrap();
    }
    h.driver.fail_pin(6);

    let report = h.service.emergency_stop();
    assert_eq!(report.stopped, vec![5, 13]);
    assert_eq!(report.timers_cancelled.len(), 3);
    assert_eq!(h.service.live_timers(), 0);
    assert_eq!(h.service.pin_status(6).unwrap().state, PinState::On);

    // The cancelled timer of the failing zone never retries.
    advance(20 * MINUTE).await;
    assert_eq!(h.driver.writes(6, false), 1);
}

#[tokio::test(start_paused = true)]
async fn emergency_stop_with_nothing_running() {
    let h = harness();
    let report = h.service.emergency_stop();
    assert!(report.stopped.is_empty());
    assert!(report.timers_cancelled.is_empty());
    assert_eq!(h.driver.total_writes(), 0);
}

// ── Shutdown ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_timers_and_releases_driver() {
    let h = harness();
    h.service.activate(5, Some(10)).unwrap();
    h.service.shutdown();

    assert_eq!(h.service.live_timers(), 0);
    assert_eq!(h.service.pin_status(5).unwrap().state, PinState::Off);
    assert!(!h.service.is_connected());
    assert_eq!(h.driver.calls().last(), Some(&DriverCall::ShutdownAll));
    assert_eq!(h.sink.events().last(), Some(&ZoneEvent::Shutdown));
}

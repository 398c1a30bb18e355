//! Concurrent access from many tasks on a multi-threaded runtime.

use std::time::Duration;

use sprinkler::state::PinState;

use crate::mock_driver::{ZONES, harness, timer_active};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_commands_keep_state_and_timers_consistent() {
    let h = harness();
    let mut tasks = Vec::new();
    for i in 0..64u32 {
        let service = h.service.clone();
        let pin = ZONES[(i % 3) as usize];
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                service.activate(pin, Some(i64::from(i % 7) + 1)).map(|_| ())
            } else {
                service.deactivate(pin)
            }
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for &pin in &ZONES[..3] {
        let on = h.service.pin_status(pin).unwrap().state == PinState::On;
        assert_eq!(on, timer_active(&h.service, pin), "pin {pin}");
    }
    assert!(h.service.live_timers() <= 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn emergency_stop_racing_activations_leaves_no_orphans() {
    let h = harness();
    let mut tasks = Vec::new();
    for &pin in &ZONES[..3] {
        let service = h.service.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..16 {
                service.activate(pin, Some(5)).unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }
    let stopper = h.service.clone();
    let stop = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1)).await;
        stopper.emergency_stop()
    });

    for task in tasks {
        task.await.unwrap();
    }
    stop.await.unwrap();

    // Whatever interleaving happened, every zone that is on has exactly
    // one live auto-off and every zone that is off has none.
    for &pin in &ZONES[..3] {
        let on = h.service.pin_status(pin).unwrap().state == PinState::On;
        assert_eq!(on, timer_active(&h.service, pin), "pin {pin}");
    }
}

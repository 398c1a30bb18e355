//! Application core: zone orchestration, no direct I/O.
//!
//! This module contains the control rules for the sprinkler system:
//! registry checks, driver actuation, state bookkeeping and auto-off
//! scheduling.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without a Raspberry Pi.

pub mod events;
pub mod ports;
pub mod service;

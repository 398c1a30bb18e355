//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the mock driver.  All tests run on the host with no GPIO
//! hardware required; auto-off timing uses tokio's paused clock.

mod concurrency_tests;
mod control_service_tests;

//! Relay drivers: concrete [`PinDriver`] backends.
//!
//! | Backend       | Type                         | Connects to                 |
//! |---------------|------------------------------|-----------------------------|
//! | `simulation`  | [`sim::SimulatedDriver`]     | in-memory levels only       |
//! | `gpio-cdev`   | [`gpio::OutputPinDriver`]    | `/dev/gpiochipN` lines      |
//!
//! [`select`] picks one from configuration.  `auto` prefers real lines
//! and falls back to simulation, so the daemon also runs on a laptop.

pub mod gpio;
pub mod sim;

#[cfg(feature = "gpio-cdev")]
pub mod cdev;

use std::sync::Arc;

use log::{info, warn};

use crate::app::ports::PinDriver;
use crate::config::{Backend, SystemConfig};

/// Build the backend named by `config.backend`.
pub fn select(config: &SystemConfig) -> anyhow::Result<Arc<dyn PinDriver>> {
    match config.backend {
        Backend::Simulation => {
            info!("Running in simulation mode");
            Ok(Arc::new(sim::SimulatedDriver::new()))
        }
        Backend::Cdev => open_cdev(config),
        Backend::Auto => match open_cdev(config) {
            Ok(driver) => Ok(driver),
            Err(e) => {
                warn!("GPIO unavailable ({:#}), running in simulation mode", e);
                Ok(Arc::new(sim::SimulatedDriver::new()))
            }
        },
    }
}

#[cfg(feature = "gpio-cdev")]
fn open_cdev(config: &SystemConfig) -> anyhow::Result<Arc<dyn PinDriver>> {
    let driver = cdev::open(&config.gpio_chip, &config.controllable_pins)?;
    Ok(Arc::new(driver))
}

#[cfg(not(feature = "gpio-cdev"))]
fn open_cdev(_config: &SystemConfig) -> anyhow::Result<Arc<dyn PinDriver>> {
    anyhow::bail!("built without the gpio-cdev feature")
}

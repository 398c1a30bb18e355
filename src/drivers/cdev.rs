//! Linux GPIO character-device lines.
//!
//! Requests every zone line from `/dev/gpiochipN` as an output, initially
//! low, and wraps each handle in a `linux-embedded-hal` [`CdevPin`].  The
//! kernel releases the lines when the handles drop.

use anyhow::{Context, Result};
use gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::CdevPin;
use log::info;

use super::gpio::OutputPinDriver;
use crate::pins::PinId;

pub const BACKEND: &str = "gpio-cdev";

/// Consumer label shown by `gpioinfo`.
const CONSUMER: &str = "sprinklerd";

pub fn open(chip_path: &str, pins: &[PinId]) -> Result<OutputPinDriver<CdevPin>> {
    let mut chip =
        Chip::new(chip_path).with_context(|| format!("failed to open GPIO chip {chip_path}"))?;

    let mut lines = Vec::with_capacity(pins.len());
    for &pin in pins {
        let handle = chip
            .get_line(u32::from(pin))
            .and_then(|line| line.request(LineRequestFlags::OUTPUT, 0, CONSUMER))
            .with_context(|| format!("failed to request GPIO line {pin} on {chip_path}"))?;
        let line = CdevPin::new(handle).with_context(|| format!("GPIO line {pin}"))?;
        lines.push((pin, line));
    }
    let driver = OutputPinDriver::new(BACKEND, lines);
    info!("GPIO: {} lines requested on {}", driver.line_count(), chip_path);
    Ok(driver)
}

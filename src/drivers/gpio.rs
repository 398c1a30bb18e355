//! Relay driver over `embedded-hal` output pins.
//!
//! One [`OutputPin`] per zone, each behind its own lock so writes to
//! different zones never wait on each other.  HIGH energises the relay
//! input.  Any HAL that implements embedded-hal 1.0 digital outputs can
//! back it; production uses Linux character-device lines.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::app::ports::PinDriver;
use crate::error::DriverError;
use crate::pins::PinId;

pub struct OutputPinDriver<P> {
    backend: &'static str,
    lines: BTreeMap<PinId, Mutex<P>>,
}

impl<P: OutputPin + Send> OutputPinDriver<P> {
    pub fn new(backend: &'static str, lines: impl IntoIterator<Item = (PinId, P)>) -> Self {
        Self {
            backend,
            lines: lines
                .into_iter()
                .map(|(pin, line)| (pin, Mutex::new(line)))
                .collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn write(&self, pin: PinId, on: bool) -> Result<(), DriverError> {
        let line = self.lines.get(&pin).ok_or(DriverError::NotConfigured(pin))?;
        let mut line = line.lock().unwrap_or_else(PoisonError::into_inner);
        let result = if on { line.set_high() } else { line.set_low() };
        result.map_err(|e| DriverError::WriteFailed {
            pin,
            reason: format!("{e:?}"),
        })
    }
}

impl<P: OutputPin + Send> PinDriver for OutputPinDriver<P> {
    fn backend(&self) -> &'static str {
        self.backend
    }

    fn initialize(&self, pins: &[PinId]) -> bool {
        let mut connected = !pins.is_empty();
        for &pin in pins {
            match self.write(pin, false) {
                Ok(()) => {}
                Err(DriverError::NotConfigured(_)) => {
                    warn!("GPIO: zone pin {} has no output line", pin);
                    connected = false;
                }
                Err(e) => {
                    error!("GPIO initialization failed: {}", e);
                    connected = false;
                }
            }
        }
        if connected {
            info!("GPIO initialized. Connected pins: {:?}", pins);
        }
        connected
    }

    fn set_level(&self, pin: PinId, on: bool) -> Result<(), DriverError> {
        self.write(pin, on)?;
        info!("Pin {} set to {}", pin, if on { "ON" } else { "OFF" });
        Ok(())
    }

    fn shutdown_all(&self) {
        for &pin in self.lines.keys() {
            if let Err(e) = self.write(pin, false) {
                error!("GPIO shutdown: {}", e);
            }
        }
        info!("GPIO: all lines driven low");
    }
}

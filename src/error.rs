//! Unified error types for the sprinkler controller.
//!
//! Every fallible library operation funnels into one of three enums:
//! [`ControlError`] for zone commands, [`DriverError`] for the actuation
//! backend, and [`ConfigError`] for startup configuration.  Protocol-level
//! translation (status codes, `Unauthorized`) lives in the HTTP adapter.

use thiserror::Error;

use crate::pins::PinId;

// ---------------------------------------------------------------------------
// Zone command errors
// ---------------------------------------------------------------------------

/// Errors surfaced by [`ControlService`](crate::app::service::ControlService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The pin is not in the controllable list.
    #[error("pin {0} not available")]
    NotFound(PinId),
    /// The pin is on the denylist and may not be energised.
    #[error("pin {0} is denied for safety")]
    Forbidden(PinId),
    /// The actuation backend rejected the write.
    #[error("failed to control GPIO pin: {0}")]
    Driver(#[from] DriverError),
}

// ---------------------------------------------------------------------------
// Driver errors
// ---------------------------------------------------------------------------

/// Errors reported by a [`PinDriver`](crate::app::ports::PinDriver).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The backend has no output line for this pin.
    #[error("pin {0} has no configured output line")]
    NotConfigured(PinId),
    /// The HAL returned an error while writing the line.
    #[error("write to pin {pin} failed: {reason}")]
    WriteFailed { pin: PinId, reason: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating [`SystemConfig`](crate::config::SystemConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field failed range or consistency validation.
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    /// An environment variable could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
    /// The JSON config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The JSON config file is malformed.
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Library-wide `Result` alias for zone commands.
pub type Result<T> = core::result::Result<T, ControlError>;

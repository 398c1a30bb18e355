//! System configuration parameters
//!
//! All tunable parameters for the sprinkler daemon.  Values come from, in
//! order: built-in defaults, an optional JSON file named by
//! `SPRINKLER_CONFIG`, then individual environment variables.  Invalid
//! values are rejected, never silently clamped.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins::{DEFAULT_DENIED_PINS, DEFAULT_ZONE_PINS, PinId, PinRegistry};
use crate::safety::{DEFAULT_RUN_MINUTES, DurationPolicy};

// --- Environment keys ---
pub const ENV_CONFIG_PATH: &str = "SPRINKLER_CONFIG";
pub const ENV_API_TOKEN: &str = "SPRINKLER_API_TOKEN";
pub const ENV_BIND: &str = "BIND";
pub const ENV_PORT: &str = "PORT";
pub const ENV_ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";
pub const ENV_GPIO_PINS: &str = "GPIO_PINS";
pub const ENV_DENIED_PINS: &str = "DENIED_PINS";
pub const ENV_BACKEND: &str = "SPRINKLER_BACKEND";
pub const ENV_GPIO_CHIP: &str = "GPIO_CHIP";
pub const ENV_DEFAULT_DURATION: &str = "DEFAULT_DURATION_MINUTES";
pub const ENV_MAX_DURATION: &str = "MAX_DURATION_MINUTES";

/// Which relay backend to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Character-device lines if available, otherwise simulation.
    #[default]
    Auto,
    Simulation,
    Cdev,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "simulation" | "sim" => Ok(Self::Simulation),
            "cdev" | "gpio-cdev" => Ok(Self::Cdev),
            _ => Err(()),
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- HTTP ---
    /// Listen address
    pub bind: String,
    /// Listen port
    pub port: u16,
    /// Shared bearer secret.  `None` leaves mutating endpoints open.
    pub api_token: Option<String>,
    /// CORS origin allow-list
    pub allowed_origins: Vec<String>,

    // --- Zones ---
    /// Zone relay lines, in zone order
    pub controllable_pins: Vec<PinId>,
    /// Lines that must never be energised
    pub denied_pins: Vec<PinId>,

    // --- Run time ---
    /// Auto-off delay when a request gives none (minutes)
    pub default_duration_minutes: u32,
    /// Optional upper bound on requested run time (minutes)
    pub max_duration_minutes: Option<u32>,

    // --- Driver ---
    pub backend: Backend,
    /// GPIO character device
    pub gpio_chip: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8000,
            api_token: None,
            allowed_origins: vec![
                "http://localhost:5000".into(),
                "https://localhost:5000".into(),
            ],
            controllable_pins: DEFAULT_ZONE_PINS.to_vec(),
            denied_pins: DEFAULT_DENIED_PINS.to_vec(),
            default_duration_minutes: DEFAULT_RUN_MINUTES,
            max_duration_minutes: None,
            backend: Backend::Auto,
            gpio_chip: "/dev/gpiochip0".into(),
        }
    }
}

impl SystemConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(ENV_CONFIG_PATH) {
            Some(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_slice(&bytes)
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_slice(bytes)?;
        config.api_token = normalize_token(config.api_token.take());
        Ok(config)
    }

    /// Overlay individual environment variables.
    pub fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.api_token = normalize_token(Some(token));
        }
        if let Some(v) = lookup(ENV_BIND) {
            self.bind = v.trim().to_owned();
        }
        if let Some(v) = lookup(ENV_PORT) {
            self.port = parse_num(ENV_PORT, &v)?;
        }
        if let Some(v) = lookup(ENV_ALLOWED_ORIGINS) {
            self.allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(v) = lookup(ENV_GPIO_PINS) {
            self.controllable_pins = parse_pins(ENV_GPIO_PINS, &v)?;
        }
        if let Some(v) = lookup(ENV_DENIED_PINS) {
            self.denied_pins = parse_pins(ENV_DENIED_PINS, &v)?;
        }
        if let Some(v) = lookup(ENV_BACKEND) {
            self.backend = v.parse().map_err(|()| ConfigError::InvalidEnv {
                key: ENV_BACKEND,
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup(ENV_GPIO_CHIP) {
            self.gpio_chip = v.trim().to_owned();
        }
        if let Some(v) = lookup(ENV_DEFAULT_DURATION) {
            self.default_duration_minutes = parse_num(ENV_DEFAULT_DURATION, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_DURATION) {
            self.max_duration_minutes = match v.trim().to_ascii_lowercase().as_str() {
                "" | "none" | "off" => None,
                _ => Some(parse_num(ENV_MAX_DURATION, &v)?),
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(invalid("port must be non-zero"));
        }
        if self.default_duration_minutes == 0 {
            return Err(invalid("default_duration_minutes must be at least 1"));
        }
        if let Some(max) = self.max_duration_minutes {
            if max < self.default_duration_minutes {
                return Err(invalid(
                    "max_duration_minutes must not be below default_duration_minutes",
                ));
            }
        }
        if self.allowed_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(invalid("allowed_origins contains an empty entry"));
        }
        self.socket_addr()?;
        self.registry()?;
        Ok(())
    }

    pub fn registry(&self) -> Result<PinRegistry, ConfigError> {
        PinRegistry::new(&self.controllable_pins, &self.denied_pins)
    }

    pub fn duration_policy(&self) -> DurationPolicy {
        DurationPolicy::new(self.default_duration_minutes, self.max_duration_minutes)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind
            .parse()
            .map_err(|_| invalid(&format!("bind address {:?} is not an IP", self.bind)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// An empty secret means "no authentication", same as unset.
fn normalize_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationFailed(msg.to_owned())
}

fn parse_num<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_owned(),
    })
}

fn parse_pins(key: &'static str, value: &str) -> Result<Vec<PinId>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| parse_num(key, p))
        .collect()
}

//! Fuzz target: `SystemConfig` JSON loader
//!
//! Feeds arbitrary bytes to the configuration parser and verifies:
//! - No panics under any byte sequence
//! - A config that passes `validate()` always yields a registry and a
//!   socket address
//! - The duration policy never produces a zero-minute run
//!
//! cargo fuzz run fuzz_config_loader

#![no_main]

use libfuzzer_sys::fuzz_target;
use sprinkler::config::SystemConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = SystemConfig::from_json_slice(data) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }
    let registry = config.registry().expect("validated config builds a registry");
    assert!(!registry.list_controllable().is_empty());
    config
        .socket_addr()
        .expect("validated config has a socket address");
    assert!(config.duration_policy().normalize(None) >= 1);
});

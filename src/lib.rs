//! Sprinkler zone controller library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! `sprinklerd` binary.  Hardware access lives behind the
//! [`PinDriver`](app::ports::PinDriver) port; the Linux GPIO backend is
//! gated by the `gpio-cdev` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod safety;
pub mod scheduler;
pub mod state;

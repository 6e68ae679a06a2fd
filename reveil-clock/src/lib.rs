//! Reveil alarm clock daemon.
//!
//! A bedside clock: recurring weekly alarms with per-date overrides,
//! a ringing/snooze/dismiss lifecycle, and a REST API for the
//! frontend. The [`engine`] holds the scheduling logic, [`store`] the
//! persisted alarm data, [`hw`] the clock/audio/display seams (with
//! mock variants for development off the device), and [`api`] the
//! HTTP surface.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod hw;
pub mod store;
pub mod tracing;
pub mod types;

pub use error::{Error, Result};

//! Shared domain types for the camwatch fleet monitor.
//!
//! This crate carries everything the other crates agree on:
//!
//! - [`types`] — sensor channel identity and decoded sensor state.
//! - [`debounce`] — the per-channel debounce state machine that decides
//!   suppress-vs-fire for each incoming device event.
//! - [`config`] — startup configuration (cameras, SMTP, callback host).
//!
//! No I/O happens here.

pub mod config;
pub mod debounce;
pub mod types;

pub use config::{CameraConfig, Config, ConfigError, NasConfig, SmtpConfig};
pub use debounce::{DebounceGate, Decision};
pub use types::{SensorChannel, SensorState, Timestamp};

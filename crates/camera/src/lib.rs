//! Camera event-source adapter.
//!
//! - [`EventSource`] — the boundary trait the rest of the system
//!   depends on: subscription ticks, current per-channel state,
//!   on-demand snapshots, disconnect.
//! - [`HikClient`] — concrete Hikvision ISAPI client implementing the
//!   trait over a long-lived HTTP alert stream.
//! - [`alert`] — decoding of the vendor alert payloads into generic
//!   (sensor, channel, active) tuples.

pub mod alert;
pub mod client;
pub mod source;

pub use client::HikClient;
pub use source::{CameraError, EventSource};

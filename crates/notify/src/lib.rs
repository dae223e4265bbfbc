//! Notification dispatch: alert email with a snapshot attachment plus
//! an advisory HTTP callback.
//!
//! - [`Notification`] — ephemeral value fired once per qualifying event.
//! - [`EmailDelivery`] — multipart SMTP delivery via `lettre`.
//! - [`CallbackDelivery`] — best-effort HTTP GET ping.
//! - [`Notifier`] / [`Dispatcher`] — the seam the sensor monitor calls;
//!   deduplication is entirely the monitor's responsibility, this layer
//!   makes exactly one email attempt and one callback ping per call.

pub mod callback;
pub mod dispatcher;
pub mod email;

pub use callback::{CallbackDelivery, CallbackError};
pub use dispatcher::{Dispatcher, Notification, Notifier, NotifyError};
pub use email::{EmailDelivery, EmailError};

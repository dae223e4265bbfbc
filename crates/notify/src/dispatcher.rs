//! The notification seam between sensor monitors and delivery.

use async_trait::async_trait;
use camwatch_core::Timestamp;

use crate::callback::CallbackDelivery;
use crate::email::{EmailDelivery, EmailError};

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// One alert-worthy occurrence.
///
/// Built per fired event from the sensor identity, the deciding
/// trigger time, and a freshly fetched snapshot; consumed immediately
/// by the dispatcher and then discarded.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Composed sensor name, e.g. `"Back Door Motion 1"`.
    pub sensor_name: String,
    /// Timestamp of the deciding observation.
    pub trigger_time: Timestamp,
    /// JPEG bytes fetched after the deciding event.
    pub snapshot: Vec<u8>,
    /// Per-camera advisory callback URL.
    pub callback_url: String,
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a failed dispatch.
///
/// Only email failures surface; callback failures are advisory and
/// are swallowed inside the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Email(#[from] EmailError),
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Capability to deliver one notification.
///
/// Implemented by the production [`Dispatcher`] and by test doubles.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the notification: exactly one email attempt and one
    /// callback ping, no retries, no deduplication.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Production dispatcher: authenticated SMTP email plus a best-effort
/// HTTP callback.
pub struct Dispatcher {
    email: EmailDelivery,
    callback: CallbackDelivery,
}

impl Dispatcher {
    pub fn new(email: EmailDelivery, callback: CallbackDelivery) -> Self {
        Self { email, callback }
    }
}

#[async_trait]
impl Notifier for Dispatcher {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email_result = self.email.deliver(notification).await;

        // The callback is issued independently of the email outcome.
        if let Err(e) = self.callback.ping(&notification.callback_url).await {
            tracing::warn!(
                url = %notification.callback_url,
                error = %e,
                "Callback ping failed"
            );
        }

        Ok(email_result?)
    }
}

//! Advisory HTTP callback ping.
//!
//! [`CallbackDelivery`] issues a single unauthenticated GET to the
//! per-camera callback URL when a notification fires. The response
//! status is logged and the body ignored; the outcome never affects
//! whether the email was considered sent.

use std::time::Duration;

/// HTTP request timeout for a callback ping.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for callback ping failures. Advisory only: the
/// dispatcher logs and swallows these.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// CallbackDelivery
// ---------------------------------------------------------------------------

/// Pings external callback endpoints after a notification fires.
pub struct CallbackDelivery {
    client: reqwest::Client,
}

impl CallbackDelivery {
    /// Create a delivery service with a pre-configured HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }

    /// Send one GET to the callback URL and log the response status.
    ///
    /// No retry: one attempt per fired notification.
    pub async fn ping(&self, url: &str) -> Result<(), CallbackError> {
        let response = self.client.get(url).send().await?;
        tracing::info!(url, status = response.status().as_u16(), "Callback pinged");
        Ok(())
    }
}

impl Default for CallbackDelivery {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Boundary trait for a single connected camera.

use async_trait::async_trait;
use camwatch_core::{SensorChannel, SensorState};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for camera adapter failures.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("Camera request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The device returned an unexpected HTTP status.
    #[error("Camera returned HTTP {0}")]
    HttpStatus(u16),

    /// A device payload could not be decoded.
    #[error("Camera payload parse error: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// EventSource
// ---------------------------------------------------------------------------

/// One connected camera device.
///
/// The adapter owns the event subscription and the latest decoded
/// state per channel. [`subscribe`](EventSource::subscribe) hands out
/// update ticks; each tick names the channel whose state changed, and
/// the consumer reads the state back via
/// [`current_state`](EventSource::current_state).
///
/// Guarantees: at least one tick per underlying state transition, and
/// `last_observed` strictly increasing per channel between successive
/// active transitions under normal operation. Network loss surfaces as
/// the subscription silently stalling; reconnection is the adapter's
/// own concern and carries no policy here.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Device name as reported by the camera.
    fn camera_name(&self) -> &str;

    /// Channels discovered on the device at connect time.
    fn channels(&self) -> Vec<SensorChannel>;

    /// Subscribe to state-change ticks for this device.
    fn subscribe(&self) -> broadcast::Receiver<SensorChannel>;

    /// Latest decoded state for a channel, if the channel has reported
    /// at least once.
    fn current_state(&self, channel: &SensorChannel) -> Option<SensorState>;

    /// Fetch one still image from the device.
    async fn fetch_snapshot(&self) -> Result<Vec<u8>, CameraError>;

    /// Stop the event subscription. Idempotent.
    async fn disconnect(&self);
}

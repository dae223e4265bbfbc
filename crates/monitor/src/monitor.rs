//! Per-channel sensor monitor.
//!
//! One [`SensorMonitor`] per (device, sensor, channel) triple. It owns
//! that channel's [`DebounceGate`] exclusively and drives the
//! notification pipeline exactly once per qualifying event: read the
//! adapter's current state, feed it through the gate, and on a fire
//! fetch a fresh snapshot and hand it to the [`Notifier`].

use std::sync::Arc;

use camwatch_camera::EventSource;
use camwatch_core::debounce::{DebounceGate, Decision};
use camwatch_core::{SensorChannel, Timestamp};
use camwatch_notify::{Notification, Notifier};

/// Watches one sensor channel and decides suppress-vs-fire.
pub struct SensorMonitor {
    channel: SensorChannel,
    gate: DebounceGate,
    source: Arc<dyn EventSource>,
    notifier: Arc<dyn Notifier>,
    callback_url: String,
}

impl SensorMonitor {
    pub fn new(
        channel: SensorChannel,
        source: Arc<dyn EventSource>,
        notifier: Arc<dyn Notifier>,
        callback_url: String,
    ) -> Self {
        Self {
            channel,
            gate: DebounceGate::new(),
            source,
            notifier,
            callback_url,
        }
    }

    /// The channel this monitor owns.
    pub fn channel(&self) -> &SensorChannel {
        &self.channel
    }

    /// Handle one update tick for this monitor's channel.
    ///
    /// Runs to completion, including the snapshot fetch and dispatch,
    /// before the fleet task consumes the next tick for the same
    /// device; the gate's read-compare-update is therefore serialized
    /// per channel. Dispatch failures are logged and swallowed here:
    /// one failed alert must not stop monitoring of other sensors or
    /// of later events on this one.
    pub async fn handle_update(&mut self) {
        let Some(state) = self.source.current_state(&self.channel) else {
            tracing::debug!(channel = %self.channel, "No state recorded for channel yet");
            return;
        };

        match self.gate.observe(&state) {
            Decision::Ignored => {
                tracing::debug!(channel = %self.channel, "Inactive update ignored");
            }
            Decision::Armed => {
                tracing::info!(channel = %self.channel, "Debounce window armed");
            }
            Decision::Suppressed => {
                tracing::debug!(channel = %self.channel, "Alert suppressed inside debounce window");
            }
            Decision::Fire { trigger_time } => {
                tracing::info!(channel = %self.channel, %trigger_time, "Alert firing");
                self.fire(trigger_time).await;
            }
        }
    }

    /// Fetch a fresh snapshot and dispatch the notification.
    async fn fire(&self, trigger_time: Timestamp) {
        // The snapshot is fetched after the deciding event, never cached.
        let snapshot = match self.source.fetch_snapshot().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(
                    channel = %self.channel,
                    error = %e,
                    "Snapshot fetch failed; alert dropped"
                );
                return;
            }
        };

        let notification = Notification {
            sensor_name: self.channel.name(),
            trigger_time,
            snapshot,
            callback_url: self.callback_url.clone(),
        };

        if let Err(e) = self.notifier.notify(&notification).await {
            tracing::error!(
                channel = %self.channel,
                error = %e,
                "Notification dispatch failed"
            );
        }
    }
}

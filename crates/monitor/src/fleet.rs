//! Fleet orchestration.
//!
//! [`Fleet`] owns every connected camera and its sensor monitors. One
//! task per device consumes that device's update ticks and routes each
//! tick to the owning monitor. `handle_update` is awaited inline, so
//! the debounce read-compare-update is serialized per device; channels
//! are never shared across monitors, so no further locking is needed.

use std::collections::HashMap;
use std::sync::Arc;

use camwatch_camera::EventSource;
use camwatch_core::SensorChannel;
use camwatch_notify::Notifier;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::monitor::SensorMonitor;

/// The collection of watched cameras and their monitor tasks.
pub struct Fleet {
    cancel: CancellationToken,
    sources: Vec<Arc<dyn EventSource>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Fleet {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            sources: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Number of cameras currently watched.
    pub fn camera_count(&self) -> usize {
        self.sources.len()
    }

    /// Start watching one camera: one monitor per exposed channel, one
    /// consumer task per device.
    pub fn watch(
        &mut self,
        source: Arc<dyn EventSource>,
        notifier: Arc<dyn Notifier>,
        callback_url: String,
    ) {
        let mut monitors: HashMap<SensorChannel, SensorMonitor> = HashMap::new();
        for channel in source.channels() {
            monitors.insert(
                channel.clone(),
                SensorMonitor::new(channel, source.clone(), notifier.clone(), callback_url.clone()),
            );
        }

        tracing::info!(
            camera = source.camera_name(),
            monitors = monitors.len(),
            "Watching camera"
        );

        let ticks = source.subscribe();
        let camera = source.camera_name().to_string();

        self.tasks
            .push(tokio::spawn(run_device(camera, monitors, ticks, self.cancel.clone())));
        self.sources.push(source);
    }

    /// Stop every subscription and wait for the consumer tasks.
    ///
    /// Disconnect problems are logged by the adapters; they never
    /// surface as a process exit status.
    pub async fn shutdown(self) {
        self.cancel.cancel();

        for source in &self.sources {
            source.disconnect().await;
        }

        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Device task panicked");
            }
        }

        tracing::info!("Fleet shut down");
    }
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new()
    }
}

/// Consume one device's update ticks until cancelled.
async fn run_device(
    camera: String,
    mut monitors: HashMap<SensorChannel, SensorMonitor>,
    mut ticks: broadcast::Receiver<SensorChannel>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(camera = %camera, "Device task cancelled");
                break;
            }
            tick = ticks.recv() => {
                match tick {
                    Ok(channel) => match monitors.get_mut(&channel) {
                        Some(monitor) => monitor.handle_update().await,
                        None => {
                            tracing::debug!(
                                camera = %camera,
                                channel = %channel,
                                "Tick for unmonitored channel"
                            );
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(camera = %camera, missed, "Update ticks lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!(camera = %camera, "Update stream closed");
                        break;
                    }
                }
            }
        }
    }
}

//! Concrete Hikvision ISAPI client.
//!
//! [`HikClient::connect`] probes the device, enumerates its trigger
//! channels, and spawns a background task that follows the long-lived
//! alert stream, updating per-channel state and broadcasting update
//! ticks. Network loss ends the stream task with an error log; there
//! is deliberately no reconnect policy here.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use camwatch_core::{CameraConfig, SensorChannel, SensorState};
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::alert;
use crate::source::{CameraError, EventSource};

/// HTTP request timeout for probe and snapshot requests. The alert
/// stream request is long-lived and only bounds its connect phase.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffer capacity for the update-tick channel.
const TICK_CAPACITY: usize = 64;

/// Snapshot endpoint for the primary video channel.
const SNAPSHOT_PATH: &str = "/ISAPI/Streaming/channels/101/picture";

type StateMap = RwLock<HashMap<SensorChannel, SensorState>>;

// ---------------------------------------------------------------------------
// HikClient
// ---------------------------------------------------------------------------

/// One connected Hikvision camera.
pub struct HikClient {
    name: String,
    base_url: String,
    user: String,
    password: String,
    client: reqwest::Client,
    channels: Vec<SensorChannel>,
    states: StateMap,
    ticks: broadcast::Sender<SensorChannel>,
    cancel: CancellationToken,
}

impl HikClient {
    /// Connect to a camera: probe its name, enumerate its trigger
    /// channels, and start following the alert stream.
    pub async fn connect(config: &CameraConfig) -> Result<Arc<Self>, CameraError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");

        let base_url = config.base_url();

        let device_info =
            get_text(&client, &base_url, "/ISAPI/System/deviceInfo", config).await?;
        let name = alert::device_name(&device_info).unwrap_or_else(|| config.name.clone());

        let triggers = get_text(&client, &base_url, "/ISAPI/Event/triggers", config).await?;
        let channels: Vec<SensorChannel> = alert::parse_triggers(&triggers)
            .into_iter()
            .map(|(sensor, channel)| SensorChannel::new(name.clone(), sensor, channel))
            .collect();

        if channels.is_empty() {
            return Err(CameraError::Parse(
                "Device exposed no event trigger channels".to_string(),
            ));
        }

        let (ticks, _) = broadcast::channel(TICK_CAPACITY);

        let hik = Arc::new(Self {
            name: name.clone(),
            base_url,
            user: config.user.clone(),
            password: config.password.clone(),
            client,
            channels,
            states: RwLock::new(HashMap::new()),
            ticks,
            cancel: CancellationToken::new(),
        });

        hik.clone().spawn_stream_task();

        tracing::info!(
            camera = %name,
            channels = hik.channels.len(),
            "Camera connected"
        );
        Ok(hik)
    }

    /// Run the alert stream in the background until disconnect.
    fn spawn_stream_task(self: Arc<Self>) {
        tokio::spawn(async move {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(camera = %self.name, "Alert stream cancelled");
                }
                result = self.follow_alert_stream() => {
                    match result {
                        Ok(()) => {
                            tracing::warn!(camera = %self.name, "Alert stream ended");
                        }
                        Err(e) => {
                            tracing::error!(camera = %self.name, error = %e, "Alert stream failed");
                        }
                    }
                }
            }
        });
    }

    /// Follow the device's alert stream, decoding each complete
    /// document into a state update.
    async fn follow_alert_stream(&self) -> Result<(), CameraError> {
        // A separate client: the stream response stays open for the
        // lifetime of the subscription, so no total-request timeout.
        let stream_client = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");

        let url = format!("{}/ISAPI/Event/notification/alertStream", self.base_url);
        let response = stream_client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CameraError::HttpStatus(response.status().as_u16()));
        }

        tracing::info!(camera = %self.name, "Alert stream open");

        let mut body = response.bytes_stream();
        let mut buf = String::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            buf.push_str(&String::from_utf8_lossy(&chunk));
            for doc in alert::split_documents(&mut buf) {
                if let Some(decoded) = alert::decode(&doc) {
                    self.apply_alert(decoded);
                }
            }
        }

        Ok(())
    }

    /// Record a decoded alert in the state map and broadcast a tick.
    fn apply_alert(&self, decoded: alert::Alert) {
        let channel = SensorChannel::new(self.name.clone(), decoded.sensor, decoded.channel);
        let state = SensorState {
            active: decoded.active,
            last_observed: Utc::now(),
        };

        {
            let mut states = self.states.write().expect("sensor state lock poisoned");
            states.insert(channel.clone(), state);
        }

        tracing::debug!(channel = %channel, active = state.active, "Sensor update");

        // Zero receivers just means nobody is watching this camera yet.
        let _ = self.ticks.send(channel);
    }
}

#[async_trait]
impl EventSource for HikClient {
    fn camera_name(&self) -> &str {
        &self.name
    }

    fn channels(&self) -> Vec<SensorChannel> {
        self.channels.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<SensorChannel> {
        self.ticks.subscribe()
    }

    fn current_state(&self, channel: &SensorChannel) -> Option<SensorState> {
        self.states
            .read()
            .expect("sensor state lock poisoned")
            .get(channel)
            .copied()
    }

    async fn fetch_snapshot(&self) -> Result<Vec<u8>, CameraError> {
        let url = format!("{}{}", self.base_url, SNAPSHOT_PATH);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CameraError::HttpStatus(response.status().as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn disconnect(&self) {
        self.cancel.cancel();
        tracing::info!(camera = %self.name, "Camera disconnected");
    }
}

/// GET a text resource from the device API.
async fn get_text(
    client: &reqwest::Client,
    base_url: &str,
    path: &str,
    config: &CameraConfig,
) -> Result<String, CameraError> {
    let response = client
        .get(format!("{base_url}{path}"))
        .basic_auth(&config.user, Some(&config.password))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(CameraError::HttpStatus(response.status().as_u16()));
    }

    Ok(response.text().await?)
}

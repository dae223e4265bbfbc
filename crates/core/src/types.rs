//! Sensor identity and state types.

use serde::{Deserialize, Serialize};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// ---------------------------------------------------------------------------
// SensorChannel
// ---------------------------------------------------------------------------

/// One monitorable signal on a camera: (device, sensor kind, channel index).
///
/// Immutable once discovered. Exactly one monitor owns each channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorChannel {
    /// Camera name as reported by the device.
    pub camera: String,
    /// Sensor kind, e.g. `"Motion"` or `"Video Loss"`.
    pub sensor: String,
    /// Channel index on the device (1-based on most devices).
    pub channel: u32,
}

impl SensorChannel {
    pub fn new(camera: impl Into<String>, sensor: impl Into<String>, channel: u32) -> Self {
        Self {
            camera: camera.into(),
            sensor: sensor.into(),
            channel,
        }
    }

    /// Human-readable name, used in notification subjects and bodies.
    pub fn name(&self) -> String {
        format!("{} {} {}", self.camera, self.sensor, self.channel)
    }
}

impl std::fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.camera, self.sensor, self.channel)
    }
}

// ---------------------------------------------------------------------------
// SensorState
// ---------------------------------------------------------------------------

/// Latest known state of a [`SensorChannel`] as decoded from the device
/// event stream.
///
/// Written only by the event-source adapter on receipt of a new event;
/// read by the channel's monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorState {
    /// Whether the sensor currently reports an active event.
    pub active: bool,
    /// When the device last reported this channel.
    pub last_observed: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

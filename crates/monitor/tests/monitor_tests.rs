//! Integration tests for the sensor monitor and fleet routing, driven
//! through a fake camera and recording/failing notifiers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use camwatch_camera::{CameraError, EventSource};
use camwatch_core::{SensorChannel, SensorState, Timestamp};
use camwatch_monitor::fleet::Fleet;
use camwatch_monitor::monitor::SensorMonitor;
use camwatch_notify::{Notification, Notifier, NotifyError};
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Fake camera: states are set directly by the test; every snapshot
/// fetch returns a distinct payload so freshness is observable.
struct FakeCamera {
    channels: Vec<SensorChannel>,
    states: RwLock<HashMap<SensorChannel, SensorState>>,
    ticks: broadcast::Sender<SensorChannel>,
    snapshot_counter: AtomicU32,
}

impl FakeCamera {
    fn new(channels: Vec<SensorChannel>) -> Self {
        let (ticks, _) = broadcast::channel(16);
        Self {
            channels,
            states: RwLock::new(HashMap::new()),
            ticks,
            snapshot_counter: AtomicU32::new(0),
        }
    }

    fn set_state(&self, channel: &SensorChannel, active: bool, at: Timestamp) {
        self.states.write().unwrap().insert(
            channel.clone(),
            SensorState {
                active,
                last_observed: at,
            },
        );
    }

    fn tick(&self, channel: &SensorChannel) {
        self.ticks.send(channel.clone()).expect("tick receiver alive");
    }

    fn snapshots_taken(&self) -> u32 {
        self.snapshot_counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for FakeCamera {
    fn camera_name(&self) -> &str {
        "Fake Camera"
    }

    fn channels(&self) -> Vec<SensorChannel> {
        self.channels.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<SensorChannel> {
        self.ticks.subscribe()
    }

    fn current_state(&self, channel: &SensorChannel) -> Option<SensorState> {
        self.states.read().unwrap().get(channel).copied()
    }

    async fn fetch_snapshot(&self) -> Result<Vec<u8>, CameraError> {
        let n = self.snapshot_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("snapshot-{n}").into_bytes())
    }

    async fn disconnect(&self) {}
}

/// Notifier that records every notification it receives.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Notifier that always fails, simulating an SMTP outage.
#[derive(Default)]
struct FailingNotifier {
    attempts: AtomicU32,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Email(camwatch_notify::EmailError::Build(
            "smtp outage".to_string(),
        )))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn base() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn motion_channel() -> SensorChannel {
    SensorChannel::new("Fake Camera", "Motion", 1)
}

/// Set the channel state and deliver one update to the monitor.
async fn deliver(
    camera: &FakeCamera,
    monitor: &mut SensorMonitor,
    channel: &SensorChannel,
    active: bool,
    offset_secs: i64,
) {
    camera.set_state(channel, active, base() + Duration::seconds(offset_secs));
    monitor.handle_update().await;
}

// ---------------------------------------------------------------------------
// Tests: monitor pipeline
// ---------------------------------------------------------------------------

/// The t=0/30/75/90/140 scenario: arm silently, suppress, fire,
/// suppress, fire.
#[tokio::test]
async fn scenario_fires_exactly_twice() {
    let channel = motion_channel();
    let camera = Arc::new(FakeCamera::new(vec![channel.clone()]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut monitor = SensorMonitor::new(
        channel.clone(),
        camera.clone(),
        notifier.clone(),
        "http://nas.local/cb/fake".to_string(),
    );

    deliver(&camera, &mut monitor, &channel, true, 0).await;
    assert!(notifier.sent().is_empty(), "first event arms, never fires");

    deliver(&camera, &mut monitor, &channel, true, 30).await;
    assert!(notifier.sent().is_empty(), "inside window: suppressed");

    deliver(&camera, &mut monitor, &channel, true, 75).await;
    assert_eq!(notifier.sent().len(), 1, "75s gap fires");

    deliver(&camera, &mut monitor, &channel, true, 90).await;
    assert_eq!(notifier.sent().len(), 1, "15s after fire: suppressed");

    deliver(&camera, &mut monitor, &channel, true, 140).await;
    assert_eq!(notifier.sent().len(), 2, "65s after fire: fires again");

    let sent = notifier.sent();
    assert_eq!(sent[0].trigger_time, base() + Duration::seconds(75));
    assert_eq!(sent[1].trigger_time, base() + Duration::seconds(140));
}

/// Delivering the identical event twice fires at most once.
#[tokio::test]
async fn duplicate_delivery_fires_once() {
    let channel = motion_channel();
    let camera = Arc::new(FakeCamera::new(vec![channel.clone()]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut monitor = SensorMonitor::new(
        channel.clone(),
        camera.clone(),
        notifier.clone(),
        String::new(),
    );

    deliver(&camera, &mut monitor, &channel, true, 0).await;
    deliver(&camera, &mut monitor, &channel, true, 61).await;
    assert_eq!(notifier.sent().len(), 1);

    // Same state delivered again without mutation: elapsed is zero.
    monitor.handle_update().await;
    assert_eq!(notifier.sent().len(), 1);
}

/// Inactive events never fire and never consume a snapshot.
#[tokio::test]
async fn inactive_events_are_inert() {
    let channel = motion_channel();
    let camera = Arc::new(FakeCamera::new(vec![channel.clone()]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut monitor = SensorMonitor::new(
        channel.clone(),
        camera.clone(),
        notifier.clone(),
        String::new(),
    );

    deliver(&camera, &mut monitor, &channel, false, 0).await;
    deliver(&camera, &mut monitor, &channel, true, 10).await;
    deliver(&camera, &mut monitor, &channel, false, 200).await;
    assert!(notifier.sent().is_empty());
    assert_eq!(camera.snapshots_taken(), 0);

    // The inactive event at t=200 did not touch the debounce record:
    // this fires against the t=10 arm.
    deliver(&camera, &mut monitor, &channel, true, 80).await;
    assert_eq!(notifier.sent().len(), 1);
}

/// Every fired notification carries a snapshot fetched after the
/// deciding event, and the composed sensor name.
#[tokio::test]
async fn fired_notification_is_fresh_and_named() {
    let channel = motion_channel();
    let camera = Arc::new(FakeCamera::new(vec![channel.clone()]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut monitor = SensorMonitor::new(
        channel.clone(),
        camera.clone(),
        notifier.clone(),
        "http://nas.local/cb/fake".to_string(),
    );

    deliver(&camera, &mut monitor, &channel, true, 0).await;
    assert_eq!(camera.snapshots_taken(), 0, "arming fetches nothing");

    deliver(&camera, &mut monitor, &channel, true, 61).await;
    deliver(&camera, &mut monitor, &channel, true, 122).await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(camera.snapshots_taken(), 2, "one fetch per fire");
    assert_eq!(sent[0].snapshot, b"snapshot-1".to_vec());
    assert_eq!(sent[1].snapshot, b"snapshot-2".to_vec());
    assert_eq!(sent[0].sensor_name, "Fake Camera Motion 1");
    assert_eq!(sent[0].callback_url, "http://nas.local/cb/fake");
}

/// A dispatcher failure on one channel does not prevent a later event
/// on a different channel from firing normally.
#[tokio::test]
async fn failure_on_one_channel_does_not_block_another() {
    let broken = SensorChannel::new("Fake Camera", "Motion", 1);
    let healthy = SensorChannel::new("Fake Camera", "Video Loss", 2);
    let camera = Arc::new(FakeCamera::new(vec![broken.clone(), healthy.clone()]));

    let failing = Arc::new(FailingNotifier::default());
    let recording = Arc::new(RecordingNotifier::default());

    let mut broken_monitor =
        SensorMonitor::new(broken.clone(), camera.clone(), failing.clone(), String::new());
    let mut healthy_monitor = SensorMonitor::new(
        healthy.clone(),
        camera.clone(),
        recording.clone(),
        String::new(),
    );

    // Fire on the broken channel: the dispatch error is swallowed.
    deliver(&camera, &mut broken_monitor, &broken, true, 0).await;
    deliver(&camera, &mut broken_monitor, &broken, true, 61).await;
    assert_eq!(failing.attempts.load(Ordering::SeqCst), 1);

    // The healthy channel still fires.
    deliver(&camera, &mut healthy_monitor, &healthy, true, 0).await;
    deliver(&camera, &mut healthy_monitor, &healthy, true, 61).await;
    assert_eq!(recording.sent().len(), 1);

    // And the broken channel keeps being monitored afterwards.
    deliver(&camera, &mut broken_monitor, &broken, true, 122).await;
    assert_eq!(failing.attempts.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Tests: fleet routing
// ---------------------------------------------------------------------------

/// Wait until the notifier has recorded `expected` notifications.
async fn wait_for_sent(notifier: &RecordingNotifier, expected: usize) {
    for _ in 0..200 {
        if notifier.sent().len() >= expected {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    panic!(
        "timed out waiting for {expected} notifications, got {}",
        notifier.sent().len()
    );
}

/// Ticks are routed to the owning monitor and processed in order.
#[tokio::test]
async fn fleet_routes_ticks_to_the_owning_monitor() {
    let channel = motion_channel();
    let camera = Arc::new(FakeCamera::new(vec![channel.clone()]));
    let notifier = Arc::new(RecordingNotifier::default());

    let mut fleet = Fleet::new();
    fleet.watch(
        camera.clone(),
        notifier.clone(),
        "http://nas.local/cb/fake".to_string(),
    );
    assert_eq!(fleet.camera_count(), 1);

    camera.set_state(&channel, true, base());
    camera.tick(&channel);
    // Let the device task consume the arming tick before moving the
    // state forward, as a serialized per-device stream would.
    tokio::time::sleep(StdDuration::from_millis(100)).await;

    camera.set_state(&channel, true, base() + Duration::seconds(61));
    camera.tick(&channel);

    wait_for_sent(&notifier, 1).await;
    assert_eq!(notifier.sent()[0].sensor_name, "Fake Camera Motion 1");

    fleet.shutdown().await;
}

/// A tick for a channel with no monitor is ignored without panicking.
#[tokio::test]
async fn fleet_ignores_unmonitored_channels() {
    let known = motion_channel();
    let unknown = SensorChannel::new("Fake Camera", "Intrusion", 9);
    let camera = Arc::new(FakeCamera::new(vec![known.clone()]));
    let notifier = Arc::new(RecordingNotifier::default());

    let mut fleet = Fleet::new();
    fleet.watch(camera.clone(), notifier.clone(), String::new());

    camera.set_state(&unknown, true, base());
    camera.tick(&unknown);

    // The known channel still works after the stray tick.
    camera.set_state(&known, true, base());
    camera.tick(&known);
    tokio::time::sleep(StdDuration::from_millis(100)).await;

    camera.set_state(&known, true, base() + Duration::seconds(61));
    camera.tick(&known);

    wait_for_sent(&notifier, 1).await;
    fleet.shutdown().await;
}

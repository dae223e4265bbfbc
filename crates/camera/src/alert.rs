//! Decoding of ISAPI alert payloads.
//!
//! The device pushes `<EventNotificationAlert>` XML documents over a
//! long-lived HTTP response. Only a handful of scalar fields matter,
//! so they are pulled with cached regexes rather than a full XML
//! parser. The same helpers decode the `/ISAPI/Event/triggers`
//! enumeration used to discover channels at connect time.

use std::sync::OnceLock;

use regex::Regex;

/// Closing tag that terminates one alert document on the stream.
const ALERT_END: &str = "</EventNotificationAlert>";

/// Opening tag of one alert document.
const ALERT_START: &str = "<EventNotificationAlert";

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

/// A decoded device alert: one generic (sensor, channel, active) tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Sensor name mapped from the vendor event type.
    pub sensor: String,
    /// Channel index the alert refers to.
    pub channel: u32,
    /// Whether the event is in its active state.
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

fn event_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<eventType>([^<]+)</eventType>").expect("static regex"))
}

fn event_state_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<eventState>([^<]+)</eventState>").expect("static regex"))
}

fn channel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<channelID>([^<]+)</channelID>").expect("static regex"))
}

fn input_channel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<videoInputChannelID>([^<]+)</videoInputChannelID>").expect("static regex")
    })
}

fn post_count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<activePostCount>([^<]+)</activePostCount>").expect("static regex")
    })
}

fn device_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<deviceName>([^<]+)</deviceName>").expect("static regex"))
}

fn trigger_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<EventTrigger>.*?</EventTrigger>").expect("static regex"))
}

fn capture<'a>(re: &Regex, doc: &'a str) -> Option<&'a str> {
    re.captures(doc)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Map a vendor event type code to a sensor name.
///
/// Unknown codes pass through unchanged so new firmware still produces
/// a monitorable channel.
pub fn sensor_name(event_type: &str) -> String {
    match event_type {
        "VMD" => "Motion".to_string(),
        "videoloss" => "Video Loss".to_string(),
        "shelteralarm" | "tamperdetection" => "Tamper Detection".to_string(),
        "linedetection" => "Line Crossing".to_string(),
        "fielddetection" => "Intrusion".to_string(),
        "IO" => "I/O Input".to_string(),
        "PIR" => "PIR".to_string(),
        other => other.to_string(),
    }
}

/// Decode one alert document.
///
/// Returns `None` when the event type is missing (malformed payloads).
/// The channel defaults to 1 for single-channel devices that omit
/// `channelID`. Activity comes from `eventState` when present,
/// otherwise from a non-zero `activePostCount`.
pub fn decode(doc: &str) -> Option<Alert> {
    let event_type = capture(event_type_re(), doc)?;

    let channel = capture(channel_re(), doc)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);

    let active = match capture(event_state_re(), doc) {
        Some(state) => state == "active",
        None => capture(post_count_re(), doc)
            .and_then(|s| s.parse::<u32>().ok())
            .map(|count| count > 0)
            .unwrap_or(false),
    };

    Some(Alert {
        sensor: sensor_name(event_type),
        channel,
        active,
    })
}

/// Drain every complete alert document from the stream buffer.
///
/// The buffer keeps any trailing partial document for the next chunk.
pub fn split_documents(buf: &mut String) -> Vec<String> {
    let mut docs = Vec::new();

    while let Some(end) = buf.find(ALERT_END) {
        let upto = end + ALERT_END.len();
        let chunk: String = buf.drain(..upto).collect();
        if let Some(start) = chunk.find(ALERT_START) {
            docs.push(chunk[start..].to_string());
        }
    }

    docs
}

/// Enumerate (sensor name, channel) pairs from the device trigger list.
pub fn parse_triggers(xml: &str) -> Vec<(String, u32)> {
    let mut out: Vec<(String, u32)> = Vec::new();

    for block in trigger_block_re().find_iter(xml) {
        let block = block.as_str();
        let Some(event_type) = capture(event_type_re(), block) else {
            continue;
        };
        let channel = capture(input_channel_re(), block)
            .or_else(|| capture(channel_re(), block))
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        out.push((sensor_name(event_type), channel));
    }

    out.sort();
    out.dedup();
    out
}

/// Extract the device name from a `deviceInfo` document.
pub fn device_name(xml: &str) -> Option<String> {
    capture(device_name_re(), xml).map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

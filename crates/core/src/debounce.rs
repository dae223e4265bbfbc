//! Per-channel event debounce.
//!
//! [`DebounceGate`] decides, for each active observation on one sensor
//! channel, whether it is a new alert-worthy occurrence or a repeat to
//! be suppressed. The gate has two states: unarmed (no prior trigger
//! recorded) and armed with the last trigger time. The first active
//! observation arms the gate without firing, so a device replaying
//! stale "active" state right after the subscription opens cannot
//! cause an alert storm.

use chrono::Duration;

use crate::types::{SensorState, Timestamp};

/// Minimum spacing enforced between two fired notifications for the
/// same sensor channel. The comparison is strict: an observation
/// exactly this far from the last trigger is still suppressed.
pub const DEBOUNCE_WINDOW_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Outcome of feeding one observation through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The observation was inactive. Inactive transitions never fire
    /// and never touch the debounce record.
    Ignored,
    /// First active observation: the window is armed, no notification.
    Armed,
    /// Active observation inside the window: suppressed.
    Suppressed,
    /// Active observation outside the window: notify.
    Fire {
        /// Timestamp of the deciding observation; becomes the new
        /// last-trigger time.
        trigger_time: Timestamp,
    },
}

// ---------------------------------------------------------------------------
// DebounceGate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unarmed,
    Armed { last_trigger: Timestamp },
}

/// Debounce record for one sensor channel.
///
/// Owned exclusively by that channel's monitor. The whole
/// read-compare-update sequence is a single `&mut self` call, so it is
/// atomic with respect to other events on the same channel as long as
/// events for one device are delivered serially.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    state: State,
}

impl DebounceGate {
    /// A gate with no prior trigger recorded.
    pub fn new() -> Self {
        Self {
            state: State::Unarmed,
        }
    }

    /// The recorded last-trigger time, if the gate is armed.
    ///
    /// Once set, this value is monotonically non-decreasing.
    pub fn last_trigger(&self) -> Option<Timestamp> {
        match self.state {
            State::Unarmed => None,
            State::Armed { last_trigger } => Some(last_trigger),
        }
    }

    /// Feed one observation through the gate.
    ///
    /// Inactive observations are ignored entirely. The first active
    /// observation arms the gate at its `last_observed` time without
    /// firing. After that, an active observation fires only when
    /// strictly more than [`DEBOUNCE_WINDOW_SECS`] have elapsed since
    /// the last trigger; firing moves the trigger time forward.
    pub fn observe(&mut self, observation: &SensorState) -> Decision {
        if !observation.active {
            return Decision::Ignored;
        }

        match self.state {
            State::Unarmed => {
                self.state = State::Armed {
                    last_trigger: observation.last_observed,
                };
                Decision::Armed
            }
            State::Armed { last_trigger } => {
                let elapsed = observation.last_observed.signed_duration_since(last_trigger);
                if elapsed > Duration::seconds(DEBOUNCE_WINDOW_SECS) {
                    self.state = State::Armed {
                        last_trigger: observation.last_observed,
                    };
                    Decision::Fire {
                        trigger_time: observation.last_observed,
                    }
                } else {
                    Decision::Suppressed
                }
            }
        }
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

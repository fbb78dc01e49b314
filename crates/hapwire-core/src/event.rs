//! Bridge events emitted by accessory bindings.
//!
//! These events are the primary way bindings communicate observed state to
//! the rest of the system. The external catalog consumes value-changed
//! events; everything else is informational.

use serde::{Deserialize, Serialize};

/// Event emitted by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// A characteristic value changed (read-driven, already mapped).
    CharacteristicChanged {
        accessory: String,
        service: String,
        characteristic: String,
        value: String,
        timestamp: i64,
    },

    /// An accessory identify action completed.
    Identify {
        accessory: String,
        success: bool,
        result: Option<String>,
        timestamp: i64,
    },

    /// A poller for a characteristic was armed or re-armed.
    PollerArmed {
        accessory: String,
        characteristic: String,
        interval_secs: u64,
        timestamp: i64,
    },
}

impl BridgeEvent {
    /// Get the accessory name for this event.
    pub fn accessory(&self) -> &str {
        match self {
            Self::CharacteristicChanged { accessory, .. }
            | Self::Identify { accessory, .. }
            | Self::PollerArmed { accessory, .. } => accessory,
        }
    }

    /// Get the timestamp for this event.
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::CharacteristicChanged { timestamp, .. }
            | Self::Identify { timestamp, .. }
            | Self::PollerArmed { timestamp, .. } => *timestamp,
        }
    }
}

/// Current unix timestamp in seconds, for event construction.
pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

//! Bridge configuration model.
//!
//! One bridge hosts any number of accessories; each accessory names its
//! credentials, an optional identify action, a default refresh interval
//! and a list of services resolved against the catalog.
//!
//! ```json
//! {
//!   "accessories": [{
//!     "name": "Heater",
//!     "username": "admin",
//!     "password": "secret",
//!     "forceRefreshDelay": 30,
//!     "services": [{
//!       "type": "temperature-sensor",
//!       "name": "Living Room",
//!       "characteristics": {
//!         "CurrentTemperature": {
//!           "get": {
//!             "url": "http://heater/api/temp",
//!             "mappers": [{"type": "jsonPath", "parameters": {"jsonPath": "$.temp"}}]
//!           }
//!         }
//!       }
//!     }]
//!   }]
//! }
//! ```

use crate::action::ActionConfig;
use crate::http::AuthConfig;
use hapwire_core::{config_err, Result};
use serde::Deserialize;
use std::collections::HashMap;

fn default_true() -> bool {
    true
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Accessories hosted by this bridge.
    #[serde(default)]
    pub accessories: Vec<AccessoryConfig>,
}

impl BridgeConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| config_err!("Invalid bridge configuration: {}", e))
    }
}

/// Configuration of one accessory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryConfig {
    /// Accessory display name.
    pub name: String,
    /// Verbose per-accessory logging.
    #[serde(default)]
    pub debug: bool,
    /// Basic-auth username for this accessory's endpoints.
    #[serde(default)]
    pub username: Option<String>,
    /// Basic-auth password.
    #[serde(default)]
    pub password: Option<String>,
    /// Send credentials preemptively rather than after a 401 challenge.
    #[serde(default = "default_true")]
    pub immediately: bool,
    /// Default poll interval in seconds; 0 keeps reads synchronous-only.
    #[serde(default)]
    pub force_refresh_delay: u64,
    /// Identify action, resolved on demand and logged.
    #[serde(default)]
    pub identify: Option<ActionConfig>,
    /// Services to assemble against the catalog.
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

impl AccessoryConfig {
    /// Basic-auth configuration, if credentials are set.
    pub fn auth(&self) -> Option<AuthConfig> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(AuthConfig {
                username: username.clone(),
                password: password.clone(),
                send_immediately: self.immediately,
            }),
            _ => None,
        }
    }
}

/// Configuration of one service within an accessory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Catalog capability name (e.g. `"switch"`). Unknown types yield no
    /// service.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Service display name.
    pub name: String,
    /// Per-characteristic get/set actions, keyed by characteristic name.
    #[serde(default)]
    pub characteristics: HashMap<String, CharacteristicConfig>,
    /// Optional catalog characteristics to enable for this service.
    #[serde(default, rename = "optionCharacteristic")]
    pub option_characteristics: Vec<String>,
    /// Poll interval override for this service, in seconds.
    #[serde(default)]
    pub force_refresh_delay: Option<u64>,
}

/// Get/set actions for one characteristic.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacteristicConfig {
    /// Read action.
    #[serde(default)]
    pub get: Option<ActionConfig>,
    /// Write action.
    #[serde(default)]
    pub set: Option<ActionConfig>,
}

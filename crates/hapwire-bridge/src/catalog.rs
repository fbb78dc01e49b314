//! Characteristic/service catalog interface.
//!
//! The catalog is an external collaborator: it defines which capability
//! types exist, which characteristics each carries, and their value
//! semantics. The bridge only consumes this interface; a built-in catalog
//! with a realistic default set ships for standalone use.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value format of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    Bool,
    Int,
    Float,
    String,
}

impl ValueFormat {
    /// Lenient format check on a text value.
    ///
    /// Used for diagnostics only: values that fail the check are still
    /// applied, validation ownership stays with the catalog.
    pub fn accepts(&self, text: &str) -> bool {
        match self {
            Self::Bool => matches!(text, "true" | "false" | "0" | "1"),
            Self::Int => text.parse::<i64>().is_ok(),
            Self::Float => text.parse::<f64>().is_ok(),
            Self::String => true,
        }
    }
}

/// One characteristic a capability exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacteristicDescriptor {
    /// Characteristic identifier (e.g. `"On"`).
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Value format.
    pub format: ValueFormat,
    /// Minimum value (numeric formats).
    pub min: Option<f64>,
    /// Maximum value (numeric formats).
    pub max: Option<f64>,
}

/// A capability type: the set of characteristics a service of this type
/// carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDefinition {
    /// Capability identifier (the `type` field of a service config).
    pub type_name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Characteristics every service of this type has.
    pub mandatory: Vec<CharacteristicDescriptor>,
    /// Characteristics enabled per service via `optionCharacteristic`.
    pub optional: Vec<CharacteristicDescriptor>,
}

impl CapabilityDefinition {
    /// Look up a characteristic descriptor by name, mandatory or optional.
    pub fn descriptor(&self, name: &str) -> Option<&CharacteristicDescriptor> {
        self.mandatory
            .iter()
            .chain(self.optional.iter())
            .find(|d| d.name == name)
    }
}

/// Catalog of capability types.
pub trait Catalog: Send + Sync {
    /// Resolve a capability by its type name.
    fn capability(&self, type_name: &str) -> Option<CapabilityDefinition>;
}

/// Built-in catalog with a default capability set.
pub struct BuiltinCatalog {
    capabilities: HashMap<String, CapabilityDefinition>,
}

impl BuiltinCatalog {
    /// Create the catalog with the built-in capability set.
    pub fn new() -> Self {
        let mut capabilities = HashMap::new();
        for capability in builtin_capabilities() {
            capabilities.insert(capability.type_name.clone(), capability);
        }
        Self { capabilities }
    }

    /// Register or replace a capability definition.
    pub fn register(&mut self, capability: CapabilityDefinition) {
        self.capabilities
            .insert(capability.type_name.clone(), capability);
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for BuiltinCatalog {
    fn capability(&self, type_name: &str) -> Option<CapabilityDefinition> {
        self.capabilities.get(type_name).cloned()
    }
}

fn characteristic(
    name: &str,
    display_name: &str,
    format: ValueFormat,
) -> CharacteristicDescriptor {
    CharacteristicDescriptor {
        name: name.to_string(),
        display_name: display_name.to_string(),
        format,
        min: None,
        max: None,
    }
}

fn ranged(
    name: &str,
    display_name: &str,
    format: ValueFormat,
    min: f64,
    max: f64,
) -> CharacteristicDescriptor {
    CharacteristicDescriptor {
        min: Some(min),
        max: Some(max),
        ..characteristic(name, display_name, format)
    }
}

/// Default capability definitions.
fn builtin_capabilities() -> Vec<CapabilityDefinition> {
    vec![
        CapabilityDefinition {
            type_name: "switch".to_string(),
            display_name: "Switch".to_string(),
            mandatory: vec![characteristic("On", "Power State", ValueFormat::Bool)],
            optional: vec![],
        },
        CapabilityDefinition {
            type_name: "outlet".to_string(),
            display_name: "Outlet".to_string(),
            mandatory: vec![characteristic("On", "Power State", ValueFormat::Bool)],
            optional: vec![characteristic(
                "OutletInUse",
                "Outlet In Use",
                ValueFormat::Bool,
            )],
        },
        CapabilityDefinition {
            type_name: "lightbulb".to_string(),
            display_name: "Lightbulb".to_string(),
            mandatory: vec![characteristic("On", "Power State", ValueFormat::Bool)],
            optional: vec![
                ranged("Brightness", "Brightness", ValueFormat::Int, 0.0, 100.0),
                ranged("Hue", "Hue", ValueFormat::Float, 0.0, 360.0),
                ranged("Saturation", "Saturation", ValueFormat::Float, 0.0, 100.0),
            ],
        },
        CapabilityDefinition {
            type_name: "temperature-sensor".to_string(),
            display_name: "Temperature Sensor".to_string(),
            mandatory: vec![ranged(
                "CurrentTemperature",
                "Current Temperature",
                ValueFormat::Float,
                -270.0,
                100.0,
            )],
            optional: vec![],
        },
        CapabilityDefinition {
            type_name: "humidity-sensor".to_string(),
            display_name: "Humidity Sensor".to_string(),
            mandatory: vec![ranged(
                "CurrentRelativeHumidity",
                "Current Relative Humidity",
                ValueFormat::Float,
                0.0,
                100.0,
            )],
            optional: vec![],
        },
        CapabilityDefinition {
            type_name: "contact-sensor".to_string(),
            display_name: "Contact Sensor".to_string(),
            mandatory: vec![ranged(
                "ContactSensorState",
                "Contact Sensor State",
                ValueFormat::Int,
                0.0,
                1.0,
            )],
            optional: vec![],
        },
        CapabilityDefinition {
            type_name: "motion-sensor".to_string(),
            display_name: "Motion Sensor".to_string(),
            mandatory: vec![characteristic(
                "MotionDetected",
                "Motion Detected",
                ValueFormat::Bool,
            )],
            optional: vec![],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let catalog = BuiltinCatalog::new();
        let switch = catalog.capability("switch").expect("switch");
        assert_eq!(switch.mandatory.len(), 1);
        assert_eq!(switch.mandatory[0].name, "On");
        assert!(catalog.capability("flux-capacitor").is_none());
    }

    #[test]
    fn test_descriptor_searches_both_lists() {
        let catalog = BuiltinCatalog::new();
        let bulb = catalog.capability("lightbulb").expect("lightbulb");
        assert!(bulb.descriptor("On").is_some());
        assert!(bulb.descriptor("Brightness").is_some());
        assert!(bulb.descriptor("Missing").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut catalog = BuiltinCatalog::new();
        catalog.register(CapabilityDefinition {
            type_name: "switch".to_string(),
            display_name: "Custom Switch".to_string(),
            mandatory: vec![],
            optional: vec![],
        });
        let switch = catalog.capability("switch").expect("switch");
        assert_eq!(switch.display_name, "Custom Switch");
        assert!(switch.mandatory.is_empty());
    }

    #[test]
    fn test_value_format_accepts() {
        assert!(ValueFormat::Bool.accepts("true"));
        assert!(ValueFormat::Bool.accepts("0"));
        assert!(!ValueFormat::Bool.accepts("maybe"));
        assert!(ValueFormat::Int.accepts("-3"));
        assert!(!ValueFormat::Int.accepts("3.5"));
        assert!(ValueFormat::Float.accepts("21.5"));
        assert!(ValueFormat::String.accepts("anything"));
    }
}

// ── Raw hub records ──
//
// Shapes returned by the hub's configuration and state endpoints.
// Type codes stay strings here; `ipx800-core` decides which ones it
// understands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity data the hub reports about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubInfo {
    #[serde(default)]
    pub firmware_version: String,
    #[serde(default)]
    pub mac_address: String,
}

/// One extension module or firmware object, as enumerated by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Vendor type code (`"x8r"`, `"tempo"`, ...).
    #[serde(rename = "type")]
    pub type_code: String,
    /// Vendor-assigned display name.
    pub name: String,
}

impl ModuleRecord {
    pub fn new(type_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_code: type_code.into(),
            name: name.into(),
        }
    }
}

/// Everything the hub exposes about its shape.
///
/// Record order is the hub's enumeration order and is meaningful:
/// ordinals are derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyRecords {
    #[serde(default)]
    pub hub: HubInfo,
    /// Hub system channels: configuration key -> channel id
    /// (e.g. `"ioACPower_id" -> 65`).
    #[serde(default)]
    pub system: BTreeMap<String, u32>,
    #[serde(default)]
    pub extensions: Vec<ModuleRecord>,
    #[serde(default)]
    pub objects: Vec<ModuleRecord>,
}

/// Full polled state, keyed by channel id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    values: BTreeMap<u32, Value>,
}

impl StateSnapshot {
    pub fn new(values: BTreeMap<u32, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, id: u32) -> Option<&Value> {
        self.values.get(&id)
    }

    /// Digital channel state. Accepts both `{"on": bool}` and bare booleans.
    pub fn is_on(&self, id: u32) -> Option<bool> {
        match self.values.get(&id)? {
            Value::Bool(b) => Some(*b),
            Value::Object(map) => map.get("on").and_then(Value::as_bool),
            _ => None,
        }
    }

    /// Analog channel value. Accepts `{"value": n}` and bare numbers.
    pub fn value(&self, id: u32) -> Option<f64> {
        match self.values.get(&id)? {
            Value::Number(n) => n.as_f64(),
            Value::Object(map) => map.get("value").and_then(Value::as_f64),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

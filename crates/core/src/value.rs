//! Weakly-typed value tree handed to the validator.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;

/// String-keyed mapping inside a value tree.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// Value tree as produced by a generic decoder.
///
/// Numbers keep the representation the decoder chose; validation folds every
/// integer-like leaf into [`ConfigValue::Integer`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// String.
    String(String),
    /// Double-precision float.
    Float(f64),
    /// Signed 64-bit integer (canonical integer representation).
    Integer(i64),
    /// Unsigned 64-bit integer.
    Unsigned(u64),
    /// Ordered list of arbitrary values.
    List(Vec<ConfigValue>),
    /// Ordered list known to contain only mappings.
    MapList(Vec<ConfigMap>),
    /// String-keyed mapping.
    Map(ConfigMap),
}

impl ConfigValue {
    /// Name of the representation, used in type-mismatch messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Float(_) => "float64",
            Self::Integer(_) => "int64",
            Self::Unsigned(_) => "uint64",
            Self::List(_) => "list",
            Self::MapList(_) => "list of maps",
            Self::Map(_) => "map",
        }
    }

    /// Returns true for [`ConfigValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Boolean payload.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Canonical integer payload.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Borrow the mapping payload.
    #[must_use]
    pub const fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key of a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_map()?.get(key)
    }

    /// Look up a list element, for either list shape.
    #[must_use]
    pub fn index(&self, index: usize) -> Option<Self> {
        match self {
            Self::List(items) => items.get(index).cloned(),
            Self::MapList(items) => items.get(index).cloned().map(Self::Map),
            _ => None,
        }
    }

    /// Convert into a `serde_json::Value`.
    ///
    /// Non-finite floats become `null`; both list shapes become arrays.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::String(value) => Value::String(value.clone()),
            Self::Float(value) => serde_json::Number::from_f64(*value).map_or(Value::Null, Value::Number),
            Self::Integer(value) => Value::from(*value),
            Self::Unsigned(value) => Value::from(*value),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::MapList(items) => Value::Array(
                items
                    .iter()
                    .map(|map| Value::Object(map_to_json(map)))
                    .collect(),
            ),
            Self::Map(map) => Value::Object(map_to_json(map)),
        }
    }
}

fn map_to_json(map: &ConfigMap) -> serde_json::Map<String, serde_json::Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::String(value) => Self::String(value),
            Value::Number(number) => {
                if let Some(value) = number.as_u64() {
                    Self::Unsigned(value)
                } else if let Some(value) = number.as_i64() {
                    Self::Integer(value)
                } else {
                    Self::Float(number.as_f64().unwrap_or(f64::NAN))
                }
            },
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<Self>> for ConfigValue {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<ConfigMap>> for ConfigValue {
    fn from(items: Vec<ConfigMap>) -> Self {
        Self::MapList(items)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        Self::Map(map)
    }
}

impl Serialize for ConfigValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::String(value) => serializer.serialize_str(value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Unsigned(value) => serializer.serialize_u64(*value),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            },
            Self::MapList(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            },
            Self::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            },
        }
    }
}

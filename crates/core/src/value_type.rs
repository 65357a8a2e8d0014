//! Closed set of semantic value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a schema node.
///
/// Serialized as its stable integer discriminant so persisted schemas stay
/// readable by external tooling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ValueType {
    /// Schema authoring gap; values pass through unchecked.
    #[default]
    Unknown = 0,
    /// Integer number.
    Integer = 1,
    /// Floating point number.
    Float = 2,
    /// Free-form string.
    String = 3,
    /// TCP/UDP port in `[0, 65535]`.
    Port = 4,
    /// IP address or hostname (not parsed).
    Ip = 5,
    /// Boolean flag.
    Checkbox = 6,
    /// Nested structure with named children.
    Structure = 7,
    /// Ordered list of a single element type.
    Array = 8,
    /// Ordered list of structures.
    StructureArray = 9,
    /// Secret string.
    Password = 10,
    /// String restricted to a set of options.
    Select = 11,
    /// Integer intended to be unique and increasing across siblings.
    UniqueInc = 12,
}

impl ValueType {
    /// All value types in discriminant order.
    pub const ALL: [Self; 13] = [
        Self::Unknown,
        Self::Integer,
        Self::Float,
        Self::String,
        Self::Port,
        Self::Ip,
        Self::Checkbox,
        Self::Structure,
        Self::Array,
        Self::StructureArray,
        Self::Password,
        Self::Select,
        Self::UniqueInc,
    ];

    /// Lowercase label used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Port => "port",
            Self::Ip => "ip",
            Self::Checkbox => "checkbox",
            Self::Structure => "structure",
            Self::Array => "array",
            Self::StructureArray => "structure array",
            Self::Password => "password",
            Self::Select => "select",
            Self::UniqueInc => "unique integer",
        }
    }

    /// Returns true for types holding named children.
    #[must_use]
    pub const fn has_structure_subtypes(self) -> bool {
        matches!(self, Self::Structure | Self::StructureArray)
    }

    /// Returns true for types coerced to a canonical integer.
    #[must_use]
    pub const fn is_integer_like(self) -> bool {
        matches!(self, Self::Integer | Self::Port | Self::UniqueInc)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<ValueType> for u8 {
    fn from(value: ValueType) -> Self {
        value as Self
    }
}

/// Integer discriminant outside the known range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownValueType(pub u8);

impl fmt::Display for UnknownValueType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "unknown value type discriminant {}", self.0)
    }
}

impl std::error::Error for UnknownValueType {}

impl TryFrom<u8> for ValueType {
    type Error = UnknownValueType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(UnknownValueType(value))
    }
}

//! Primitive type classification.
//!
//! Maps a primitive's type name plus its `validate`/`options`/`default` tags
//! to a [`ValueType`] and an optional typed default.

use crate::error::DefinitionError;
use confschema_core::{DefaultValue, FieldTags, TagKey, ValueType};
use tracing::warn;

const STRING_TYPES: &[&str] = &["String"];
const INTEGER_TYPES: &[&str] = &[
    "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize",
];
const FLOAT_TYPES: &[&str] = &["f32", "f64"];
const BOOL_TYPES: &[&str] = &["bool"];

/// Result of classifying one primitive field.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Semantic type.
    pub value_type: ValueType,
    /// Parsed default, if any.
    pub default: Option<DefaultValue>,
}

impl Classification {
    const fn new(value_type: ValueType, default: Option<DefaultValue>) -> Self {
        Self {
            value_type,
            default,
        }
    }
}

/// Classify the primitive `type_name` of `field` using its tags.
pub fn classify_primitive(
    field: &str,
    type_name: &str,
    tags: &FieldTags,
) -> Result<Classification, DefinitionError> {
    let validate = tags.get(TagKey::Validate).unwrap_or_default();
    let default = tags.get(TagKey::Default);

    if STRING_TYPES.contains(&type_name) {
        let default = default.map(|value| DefaultValue::String(value.to_string()));
        if tags.get(TagKey::Options).is_some() {
            return Ok(Classification::new(ValueType::Select, default));
        }
        let value_type = match validate {
            "" => ValueType::String,
            "ip" => ValueType::Ip,
            "password" => ValueType::Password,
            _ => return Err(invalid_validate(field, type_name, validate)),
        };
        return Ok(Classification::new(value_type, default));
    }

    if INTEGER_TYPES.contains(&type_name) {
        let default = default.map(|value| DefaultValue::Integer(parse_default(field, value)));
        return match validate {
            "" => Ok(Classification::new(ValueType::Integer, default)),
            "port" => Ok(Classification::new(ValueType::Port, default)),
            "unique_inc" => Ok(Classification::new(ValueType::UniqueInc, None)),
            _ => Err(invalid_validate(field, type_name, validate)),
        };
    }

    if BOOL_TYPES.contains(&type_name) {
        let default = (default == Some("true")).then_some(DefaultValue::Bool(true));
        return Ok(Classification::new(ValueType::Checkbox, default));
    }

    if FLOAT_TYPES.contains(&type_name) {
        let default = default.map(|value| DefaultValue::Float(parse_default(field, value)));
        return Ok(Classification::new(ValueType::Float, default));
    }

    Err(DefinitionError::UnknownType {
        field: field.to_string(),
        type_name: type_name.to_string(),
    })
}

fn invalid_validate(field: &str, type_name: &str, validate: &str) -> DefinitionError {
    DefinitionError::InvalidValidateTag {
        field: field.to_string(),
        type_name: type_name.to_string(),
        validate: validate.to_string(),
    }
}

/// Parse a numeric default; malformed input falls back to zero.
fn parse_default<T>(field: &str, raw: &str) -> T
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().unwrap_or_else(|error| {
        warn!(field, default = raw, %error, "malformed default, using zero");
        T::default()
    })
}

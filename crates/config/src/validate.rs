//! Value-tree validation and cleaning.
//!
//! [`validate_config`] walks a [`ConfigValue`] in lock-step with a schema,
//! checks every leaf, folds integer-like leaves into `ConfigValue::Integer`
//! and returns the cleaned tree or the first error with its path.

use crate::error::{FieldPath, PathSegment, ValidationError, ValidationErrorKind};
use confschema_core::{ConfigMap, ConfigValue, ValueType, ValueTypeDescriptor};
use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::warn;

const PORT_MAX: i64 = 65_535;
/// 2^63; finite floats must truncate into `-I64_BOUND..I64_BOUND`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Extension point for checking `UniqueInc` values across a document.
///
/// The validator only checks the numeric type of a `UniqueInc` leaf; a hook
/// sees every such value with its path and may reject it. Hooks that track
/// state across calls need interior mutability.
pub trait UniqueIncHook {
    /// Inspect one value; `Err` carries the rejection reason.
    fn check(&self, path: &FieldPath, value: i64) -> Result<(), String>;
}

/// Validation policy.
#[derive(Clone, Copy, Default)]
pub struct ValidateOptions<'a> {
    /// Reject keys without a schema node instead of keeping them.
    pub strict: bool,
    /// Document name attached to warnings.
    pub source: &'a str,
    /// Optional uniqueness check for `UniqueInc` values.
    pub unique_inc: Option<&'a dyn UniqueIncHook>,
}

impl<'a> ValidateOptions<'a> {
    /// Strict policy.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Name the validated document in warnings.
    #[must_use]
    pub const fn with_source(mut self, source: &'a str) -> Self {
        self.source = source;
        self
    }

    /// Install a `UniqueInc` hook.
    #[must_use]
    pub fn with_unique_inc(mut self, hook: &'a dyn UniqueIncHook) -> Self {
        self.unique_inc = Some(hook);
        self
    }
}

impl fmt::Debug for ValidateOptions<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ValidateOptions")
            .field("strict", &self.strict)
            .field("source", &self.source)
            .field("unique_inc", &self.unique_inc.is_some())
            .finish()
    }
}

/// Validate `value` against `schema` and return the cleaned tree.
///
/// A missing schema passes the value through, or fails in strict mode.
/// Panics raised while validating are reported as
/// [`ValidationErrorKind::Internal`].
pub fn validate_config(
    schema: Option<&ValueTypeDescriptor>,
    value: ConfigValue,
    options: &ValidateOptions<'_>,
) -> Result<ConfigValue, ValidationError> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        Validator::new(options).check(schema, value)
    }));
    outcome.unwrap_or_else(|panic| {
        Err(ValidationError::new(
            FieldPath::root(),
            ValidationErrorKind::Internal {
                message: panic_message(panic.as_ref()),
            },
        ))
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic".to_string()
    }
}

// Encoders write integral floats without a fraction (`2.0` becomes `2`).
#[expect(
    clippy::cast_precision_loss,
    reason = "integral floats beyond 2^53 round like any float"
)]
const fn widen_signed(number: i64) -> f64 {
    number as f64
}

#[expect(
    clippy::cast_precision_loss,
    reason = "integral floats beyond 2^53 round like any float"
)]
const fn widen_unsigned(number: u64) -> f64 {
    number as f64
}

struct Validator<'o, 'a> {
    options: &'o ValidateOptions<'a>,
    path: FieldPath,
}

impl<'o, 'a> Validator<'o, 'a> {
    const fn new(options: &'o ValidateOptions<'a>) -> Self {
        Self {
            options,
            path: FieldPath::root(),
        }
    }

    fn error(&self, kind: ValidationErrorKind) -> ValidationError {
        ValidationError::new(self.path.clone(), kind)
    }

    fn mismatch(&self, expected: ValueType, value: &ConfigValue) -> ValidationError {
        self.error(ValidationErrorKind::TypeMismatch {
            expected,
            actual: value.kind_name(),
        })
    }

    fn check(
        &mut self,
        schema: Option<&ValueTypeDescriptor>,
        value: ConfigValue,
    ) -> Result<ConfigValue, ValidationError> {
        let Some(schema) = schema else {
            if self.options.strict {
                return Err(self.error(ValidationErrorKind::SchemaNotDefined));
            }
            return Ok(value);
        };

        let value_type = schema.value_type;
        match value_type {
            ValueType::Unknown => {
                warn!(
                    source = self.options.source,
                    path = %self.path,
                    "found unknown type in config"
                );
                Ok(value)
            },
            ValueType::Integer => self.integer(value_type, &value).map(ConfigValue::Integer),
            ValueType::Port => {
                let port = self.integer(value_type, &value)?;
                if !(0..=PORT_MAX).contains(&port) {
                    return Err(self.error(ValidationErrorKind::PortOutOfRange { value: port }));
                }
                Ok(ConfigValue::Integer(port))
            },
            ValueType::UniqueInc => {
                let number = self.integer(value_type, &value)?;
                if let Some(hook) = self.options.unique_inc {
                    hook.check(&self.path, number).map_err(|reason| {
                        self.error(ValidationErrorKind::UniqueIncRejected {
                            value: number,
                            reason,
                        })
                    })?;
                }
                Ok(ConfigValue::Integer(number))
            },
            ValueType::Float => match value {
                ConfigValue::Float(_) => Ok(value),
                ConfigValue::Integer(number) => Ok(ConfigValue::Float(widen_signed(number))),
                ConfigValue::Unsigned(number) => Ok(ConfigValue::Float(widen_unsigned(number))),
                other => Err(self.mismatch(value_type, &other)),
            },
            ValueType::String | ValueType::Password | ValueType::Ip => match value {
                ConfigValue::String(_) => Ok(value),
                other => Err(self.mismatch(value_type, &other)),
            },
            ValueType::Checkbox => match value {
                ConfigValue::Bool(_) => Ok(value),
                other => Err(self.mismatch(value_type, &other)),
            },
            ValueType::Select => match value {
                ConfigValue::String(choice) => {
                    if choice.is_empty() || schema.options.contains(&choice) {
                        Ok(ConfigValue::String(choice))
                    } else {
                        Err(self.error(ValidationErrorKind::InvalidSelectOption { value: choice }))
                    }
                },
                other => Err(self.mismatch(value_type, &other)),
            },
            ValueType::Structure => match value {
                ConfigValue::Map(map) => self.structure(schema, map).map(ConfigValue::Map),
                other => Err(self.mismatch(value_type, &other)),
            },
            ValueType::Array => match value {
                ConfigValue::Null => Ok(ConfigValue::Null),
                ConfigValue::List(items) => self.array(schema, items).map(ConfigValue::List),
                ConfigValue::MapList(maps) => self
                    .array(schema, maps.into_iter().map(ConfigValue::Map).collect())
                    .map(ConfigValue::List),
                other => Err(self.mismatch(value_type, &other)),
            },
            ValueType::StructureArray => match value {
                ConfigValue::Null => Ok(ConfigValue::Null),
                ConfigValue::MapList(maps) => {
                    self.structure_array(schema, maps).map(ConfigValue::MapList)
                },
                ConfigValue::List(items) => self.generic_structure_array(schema, items),
                other => Err(self.mismatch(value_type, &other)),
            },
        }
    }

    /// Fold any accepted numeric representation into the canonical integer.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "floats from untyped decoders are truncated toward zero"
    )]
    fn integer(&self, expected: ValueType, value: &ConfigValue) -> Result<i64, ValidationError> {
        match *value {
            ConfigValue::Integer(number) => Ok(number),
            ConfigValue::Unsigned(number) => i64::try_from(number).map_err(|_| {
                self.error(ValidationErrorKind::IntegerOutOfRange {
                    value: number.to_string(),
                })
            }),
            ConfigValue::Float(number) if number.is_finite() => {
                let truncated = number.trunc();
                if !(-I64_BOUND..I64_BOUND).contains(&truncated) {
                    return Err(self.error(ValidationErrorKind::IntegerOutOfRange {
                        value: number.to_string(),
                    }));
                }
                Ok(truncated as i64)
            },
            _ => Err(self.mismatch(expected, value)),
        }
    }

    fn structure(
        &mut self,
        schema: &ValueTypeDescriptor,
        mut map: ConfigMap,
    ) -> Result<ConfigMap, ValidationError> {
        let keys: Vec<String> = map.keys().cloned().collect();
        for key in keys {
            let Some(child) = schema.subtype(&key) else {
                if self.options.strict {
                    return Err(self.error(ValidationErrorKind::UnknownField { name: key }));
                }
                warn!(
                    source = self.options.source,
                    path = %self.path,
                    field = key.as_str(),
                    "value does not exist in schema"
                );
                continue;
            };

            let Some(value) = map.remove(&key) else {
                continue;
            };
            self.path.push(PathSegment::Field(key.clone()));
            let cleaned = self.check(Some(child), value)?;
            self.path.pop();
            map.insert(key, cleaned);
        }
        Ok(map)
    }

    fn array(
        &mut self,
        schema: &ValueTypeDescriptor,
        items: Vec<ConfigValue>,
    ) -> Result<Vec<ConfigValue>, ValidationError> {
        let element = schema.element();
        let mut cleaned = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            self.path.push(PathSegment::Index(index));
            cleaned.push(self.check(element, item)?);
            self.path.pop();
        }
        Ok(cleaned)
    }

    fn structure_array(
        &mut self,
        schema: &ValueTypeDescriptor,
        maps: Vec<ConfigMap>,
    ) -> Result<Vec<ConfigMap>, ValidationError> {
        let mut cleaned = Vec::with_capacity(maps.len());
        for (index, map) in maps.into_iter().enumerate() {
            self.path.push(PathSegment::Index(index));
            cleaned.push(self.structure(schema, map)?);
            self.path.pop();
        }
        Ok(cleaned)
    }

    /// Structure array delivered as a generic list; every element must be a map.
    fn generic_structure_array(
        &mut self,
        schema: &ValueTypeDescriptor,
        items: Vec<ConfigValue>,
    ) -> Result<ConfigValue, ValidationError> {
        let mut cleaned = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            self.path.push(PathSegment::Index(index));
            let map = match item {
                ConfigValue::Map(map) => map,
                other => return Err(self.mismatch(ValueType::Structure, &other)),
            };
            cleaned.push(ConfigValue::Map(self.structure(schema, map)?));
            self.path.pop();
        }
        Ok(ConfigValue::List(cleaned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confschema_core::StructureSubtypes;
    use std::cell::RefCell;
    use std::collections::BTreeSet;

    fn map(entries: &[(&str, ConfigValue)]) -> ConfigMap {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect()
    }

    fn schema_with(name: &str, child: ValueTypeDescriptor) -> ValueTypeDescriptor {
        let mut children = StructureSubtypes::new();
        children.insert(name.to_string(), child);
        ValueTypeDescriptor::structure(children)
    }

    fn devices_schema() -> ValueTypeDescriptor {
        let mut children = StructureSubtypes::new();
        children.insert("device_id".to_string(), ValueTypeDescriptor::leaf(ValueType::UniqueInc));
        children.insert("port".to_string(), ValueTypeDescriptor::leaf(ValueType::Port));
        schema_with("devices", ValueTypeDescriptor::structure_array(children))
    }

    fn lenient(
        schema: &ValueTypeDescriptor,
        value: ConfigValue,
    ) -> Result<ConfigValue, ValidationError> {
        validate_config(Some(schema), value, &ValidateOptions::default())
    }

    #[test]
    fn port_is_coerced_to_integer() {
        let schema = schema_with("port", ValueTypeDescriptor::leaf(ValueType::Port));
        let value = ConfigValue::Map(map(&[("port", ConfigValue::Unsigned(20))]));

        let cleaned = lenient(&schema, value);
        assert_eq!(
            cleaned.ok().and_then(|v| v.get("port").cloned()),
            Some(ConfigValue::Integer(20))
        );
    }

    #[test]
    fn port_out_of_range_is_rejected() {
        let schema = schema_with("port", ValueTypeDescriptor::leaf(ValueType::Port));
        for raw in [ConfigValue::Unsigned(70_000), ConfigValue::Integer(-1)] {
            let error = lenient(&schema, ConfigValue::Map(map(&[("port", raw)]))).err();
            assert!(matches!(
                error.map(|e| e.kind),
                Some(ValidationErrorKind::PortOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn port_string_is_a_type_mismatch() {
        let schema = schema_with("port", ValueTypeDescriptor::leaf(ValueType::Port));
        let error = lenient(&schema, ConfigValue::Map(map(&[("port", "x".into())]))).err();
        assert_eq!(
            error.map(|e| e.to_string()),
            Some("on validating port: port is no integertype, but string".to_string())
        );
    }

    #[test]
    fn floats_are_truncated_and_huge_unsigned_rejected() {
        let schema = ValueTypeDescriptor::leaf(ValueType::Integer);
        assert_eq!(lenient(&schema, ConfigValue::Float(-2.9)), Ok(ConfigValue::Integer(-2)));
        assert!(matches!(
            lenient(&schema, ConfigValue::Float(f64::NAN)).map_err(|e| e.kind),
            Err(ValidationErrorKind::TypeMismatch { actual: "float64", .. })
        ));
        assert_eq!(
            lenient(&schema, ConfigValue::Unsigned(u64::MAX)).map_err(|e| e.kind),
            Err(ValidationErrorKind::IntegerOutOfRange {
                value: u64::MAX.to_string()
            })
        );
    }

    #[test]
    fn floats_beyond_the_integer_range_are_rejected() {
        let schema = ValueTypeDescriptor::leaf(ValueType::Integer);
        assert!(matches!(
            lenient(&schema, ConfigValue::Float(1e300)).map_err(|e| e.kind),
            Err(ValidationErrorKind::IntegerOutOfRange { .. })
        ));
        assert!(matches!(
            lenient(&schema, ConfigValue::Float(-1e19)).map_err(|e| e.kind),
            Err(ValidationErrorKind::IntegerOutOfRange { .. })
        ));
        assert!(lenient(&schema, ConfigValue::Float(9_223_372_036_854_775_808.0)).is_err());
        assert_eq!(
            lenient(&schema, ConfigValue::Float(-9_223_372_036_854_775_808.0)),
            Ok(ConfigValue::Integer(i64::MIN))
        );
    }

    #[test]
    fn float_widens_integral_numbers() {
        let schema = ValueTypeDescriptor::leaf(ValueType::Float);
        assert_eq!(lenient(&schema, ConfigValue::Float(1.5)), Ok(ConfigValue::Float(1.5)));
        assert_eq!(lenient(&schema, ConfigValue::Integer(-3)), Ok(ConfigValue::Float(-3.0)));
        assert_eq!(lenient(&schema, ConfigValue::Unsigned(2)), Ok(ConfigValue::Float(2.0)));
        assert!(lenient(&schema, "2".into()).is_err());
    }

    #[test]
    fn select_accepts_options_and_empty() {
        let schema = ValueTypeDescriptor::select(["fast", "slow"]);
        assert!(lenient(&schema, "fast".into()).is_ok());
        assert!(lenient(&schema, "".into()).is_ok());
        assert_eq!(
            lenient(&schema, "turbo".into()).map_err(|e| e.to_string()),
            Err("invalid select option \"turbo\"".to_string())
        );
    }

    #[test]
    fn ip_accepts_any_string() {
        let schema = ValueTypeDescriptor::leaf(ValueType::Ip);
        assert!(lenient(&schema, "camera.local".into()).is_ok());
        assert!(lenient(&schema, ConfigValue::Bool(true)).is_err());
    }

    #[test]
    fn unknown_keys_depend_on_strictness() {
        let schema = schema_with("port", ValueTypeDescriptor::leaf(ValueType::Port));
        let value = ConfigValue::Map(map(&[("extra", "kept".into())]));

        let strict = validate_config(Some(&schema), value.clone(), &ValidateOptions::strict());
        assert_eq!(
            strict.map_err(|e| e.kind),
            Err(ValidationErrorKind::UnknownField {
                name: "extra".to_string()
            })
        );
        assert_eq!(lenient(&schema, value.clone()), Ok(value));
    }

    #[test]
    fn missing_schema_depends_on_strictness() {
        let value = ConfigValue::from("anything");
        assert_eq!(
            validate_config(None, value.clone(), &ValidateOptions::default()),
            Ok(value.clone())
        );
        assert_eq!(
            validate_config(None, value, &ValidateOptions::strict()).map_err(|e| e.kind),
            Err(ValidationErrorKind::SchemaNotDefined)
        );
    }

    #[test]
    fn null_collections_pass_through() {
        let array = ValueTypeDescriptor::array(ValueTypeDescriptor::leaf(ValueType::String));
        assert_eq!(lenient(&array, ConfigValue::Null), Ok(ConfigValue::Null));
        let devices = devices_schema();
        let value = ConfigValue::Map(map(&[("devices", ConfigValue::Null)]));
        assert_eq!(lenient(&devices, value.clone()), Ok(value));
    }

    #[test]
    fn structure_array_shapes_clean_alike() {
        let element = map(&[("device_id", ConfigValue::Float(1.0)), ("port", ConfigValue::Unsigned(80))]);
        let typed = ConfigValue::Map(map(&[("devices", ConfigValue::MapList(vec![element.clone()]))]));
        let generic = ConfigValue::Map(map(&[(
            "devices",
            ConfigValue::List(vec![ConfigValue::Map(element)]),
        )]));

        let typed = lenient(&devices_schema(), typed).map(|v| v.to_json());
        let generic = lenient(&devices_schema(), generic).map(|v| v.to_json());
        assert!(typed.is_ok());
        assert_eq!(typed, generic);
        assert_eq!(
            typed.ok().map(|json| json["devices"][0]["port"].clone()),
            Some(serde_json::json!(80))
        );
    }

    #[test]
    fn errors_carry_field_and_index_path() {
        let bad = map(&[("port", ConfigValue::Unsigned(99_999))]);
        let ok = map(&[("port", ConfigValue::Unsigned(1))]);
        let value = ConfigValue::Map(map(&[(
            "devices",
            ConfigValue::List(vec![ConfigValue::Map(ok), ConfigValue::Map(bad)]),
        )]));

        let error = lenient(&devices_schema(), value).err();
        assert_eq!(error.map(|e| e.path.to_string()), Some("devices[1].port".to_string()));
    }

    #[test]
    fn non_map_element_in_generic_structure_array_is_rejected() {
        let value = ConfigValue::Map(map(&[("devices", ConfigValue::List(vec![1_i64.into()]))]));
        let error = lenient(&devices_schema(), value).err();
        assert_eq!(
            error.map(|e| e.to_string()),
            Some("on validating devices[0]: structure is no object, but int64".to_string())
        );
    }

    #[test]
    fn unknown_schema_nodes_pass_values_through() {
        let schema = ValueTypeDescriptor::leaf(ValueType::Unknown);
        assert_eq!(lenient(&schema, ConfigValue::Bool(false)), Ok(ConfigValue::Bool(false)));
    }

    #[derive(Default)]
    struct DistinctIds {
        seen: RefCell<BTreeSet<i64>>,
    }

    impl UniqueIncHook for DistinctIds {
        fn check(&self, _path: &FieldPath, value: i64) -> Result<(), String> {
            if self.seen.borrow_mut().insert(value) {
                Ok(())
            } else {
                Err("already in use".to_string())
            }
        }
    }

    #[test]
    fn unique_inc_hook_can_reject_values() {
        let element = |id: u64| map(&[("device_id", ConfigValue::Unsigned(id))]);
        let value = ConfigValue::Map(map(&[(
            "devices",
            ConfigValue::MapList(vec![element(1), element(2), element(1)]),
        )]));

        assert!(lenient(&devices_schema(), value.clone()).is_ok());

        let hook = DistinctIds::default();
        let options = ValidateOptions::default().with_unique_inc(&hook);
        let error = validate_config(Some(&devices_schema()), value, &options).err();
        assert_eq!(error.as_ref().map(|e| e.path.to_string()), Some("devices[2].device_id".to_string()));
        assert_eq!(
            error.map(|e| e.kind),
            Some(ValidationErrorKind::UniqueIncRejected {
                value: 1,
                reason: "already in use".to_string(),
            })
        );
    }

    struct PanickingHook;

    impl UniqueIncHook for PanickingHook {
        #[allow(clippy::panic, reason = "exercises panic recovery")]
        fn check(&self, _path: &FieldPath, _value: i64) -> Result<(), String> {
            panic!("hook exploded")
        }
    }

    #[test]
    fn panics_become_internal_errors() {
        let schema = ValueTypeDescriptor::leaf(ValueType::UniqueInc);
        let options = ValidateOptions::default().with_unique_inc(&PanickingHook);
        let error = validate_config(Some(&schema), ConfigValue::Integer(1), &options).err();
        assert_eq!(
            error.map(|e| e.kind),
            Some(ValidationErrorKind::Internal {
                message: "hook exploded".to_string()
            })
        );
    }
}

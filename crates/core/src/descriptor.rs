//! Schema tree node (`ValueTypeDescriptor`) and shape checks.

use crate::value_type::ValueType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Child descriptors of a structure, keyed by field name.
pub type StructureSubtypes = BTreeMap<String, ValueTypeDescriptor>;

/// Default value carried by a leaf descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DefaultValue {
    /// Checkbox default.
    Bool(bool),
    /// Integer or port default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String, password, ip, or select default.
    String(String),
}

/// Recursive description of one field of a configuration definition.
///
/// Exactly one of `array_sub_type` / `structure_subtypes` is populated, and
/// only for `Array` respectively `Structure`/`StructureArray`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ValueTypeDescriptor {
    /// Semantic type.
    #[serde(rename = "Type")]
    #[schemars(with = "u8")]
    pub value_type: ValueType,
    /// Help text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Display label.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Section headline shown above the field.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub headline: String,
    /// Allowed values; non-empty for `Select`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Presentation order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    /// Free-form dispatch tags for presentation logic.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dispatch_options: Vec<String>,
    /// Default value matching `value_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Display hint for required-ness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    /// Display hint for hiding the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<String>,
    /// Model ids the field applies to exclusively.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only_on_model: Vec<u32>,
    /// Model ids the field does not apply to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_on_model: Vec<u32>,
    /// Element descriptor for `Array`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_sub_type: Option<Box<ValueTypeDescriptor>>,
    /// Child descriptors for `Structure` and `StructureArray`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_subtypes: Option<StructureSubtypes>,
}

impl ValueTypeDescriptor {
    /// Leaf descriptor of the given type.
    #[must_use]
    pub fn leaf(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Self::default()
        }
    }

    /// Structure descriptor with the given children.
    #[must_use]
    pub fn structure(children: StructureSubtypes) -> Self {
        Self {
            value_type: ValueType::Structure,
            structure_subtypes: Some(children),
            ..Self::default()
        }
    }

    /// Structure-array descriptor with the given element children.
    #[must_use]
    pub fn structure_array(children: StructureSubtypes) -> Self {
        Self {
            value_type: ValueType::StructureArray,
            structure_subtypes: Some(children),
            ..Self::default()
        }
    }

    /// Array descriptor with the given element descriptor.
    #[must_use]
    pub fn array(element: Self) -> Self {
        Self {
            value_type: ValueType::Array,
            array_sub_type: Some(Box::new(element)),
            ..Self::default()
        }
    }

    /// Select descriptor with the given options.
    #[must_use]
    pub fn select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value_type: ValueType::Select,
            options: options.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the order.
    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the default value.
    #[must_use]
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Child descriptor for a structure field.
    #[must_use]
    pub fn subtype(&self, name: &str) -> Option<&Self> {
        self.structure_subtypes.as_ref()?.get(name)
    }

    /// Element descriptor of an array.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        self.array_sub_type.as_deref()
    }

    /// Returns true when the dispatch options contain `tag`.
    #[must_use]
    pub fn has_dispatch(&self, tag: &str) -> bool {
        self.dispatch_options.iter().any(|option| option == tag)
    }

    /// Verify the structural invariants of the whole tree.
    ///
    /// Built trees always satisfy these; persisted trees are checked on load.
    pub fn check_shape(&self) -> Result<(), ShapeError> {
        let mut path = Vec::new();
        self.check_shape_at(&mut path)
    }

    fn check_shape_at(&self, path: &mut Vec<String>) -> Result<(), ShapeError> {
        let violation = match self.value_type {
            ValueType::Array if self.array_sub_type.is_none() => {
                Some(ShapeViolation::MissingArraySubType)
            },
            ValueType::Array if self.structure_subtypes.is_some() => {
                Some(ShapeViolation::UnexpectedStructureSubtypes)
            },
            ValueType::Structure | ValueType::StructureArray
                if self.structure_subtypes.is_none() =>
            {
                Some(ShapeViolation::MissingStructureSubtypes)
            },
            ValueType::Structure | ValueType::StructureArray if self.array_sub_type.is_some() => {
                Some(ShapeViolation::UnexpectedArraySubType)
            },
            ValueType::Array | ValueType::Structure | ValueType::StructureArray => None,
            _ if self.array_sub_type.is_some() => Some(ShapeViolation::UnexpectedArraySubType),
            _ if self.structure_subtypes.is_some() => {
                Some(ShapeViolation::UnexpectedStructureSubtypes)
            },
            ValueType::Select if self.options.is_empty() => Some(ShapeViolation::EmptySelectOptions),
            _ => None,
        };
        if let Some(violation) = violation {
            return Err(ShapeError {
                path: path.join("."),
                value_type: self.value_type,
                violation,
            });
        }

        if let Some(element) = &self.array_sub_type {
            path.push("[]".to_string());
            element.check_shape_at(path)?;
            path.pop();
        }
        if let Some(children) = &self.structure_subtypes {
            for (name, child) in children {
                path.push(name.clone());
                child.check_shape_at(path)?;
                path.pop();
            }
        }
        Ok(())
    }
}

/// Which descriptor invariant was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeViolation {
    /// `Array` without element descriptor.
    MissingArraySubType,
    /// Element descriptor on a non-array node.
    UnexpectedArraySubType,
    /// `Structure`/`StructureArray` without children.
    MissingStructureSubtypes,
    /// Children on a non-structure node.
    UnexpectedStructureSubtypes,
    /// `Select` without options.
    EmptySelectOptions,
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingArraySubType => "array is missing its element descriptor",
            Self::UnexpectedArraySubType => "element descriptor is only allowed on arrays",
            Self::MissingStructureSubtypes => "structure is missing its child descriptors",
            Self::UnexpectedStructureSubtypes => "child descriptors are only allowed on structures",
            Self::EmptySelectOptions => "select has no options",
        };
        formatter.write_str(text)
    }
}

/// Descriptor tree that violates the schema invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    /// Dot-separated location (`[]` marks an array element); empty for the root.
    pub path: String,
    /// Type of the offending node.
    pub value_type: ValueType,
    /// Broken invariant.
    pub violation: ShapeViolation,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(formatter, "{} at schema root", self.violation)
        } else {
            write!(formatter, "{} at {}", self.violation, self.path)
        }
    }
}

impl std::error::Error for ShapeError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_schema() -> ValueTypeDescriptor {
        let mut children = StructureSubtypes::new();
        children.insert("port".to_string(), ValueTypeDescriptor::leaf(ValueType::Port));
        children.insert(
            "tags".to_string(),
            ValueTypeDescriptor::array(ValueTypeDescriptor::leaf(ValueType::String)),
        );
        children.insert("mode".to_string(), ValueTypeDescriptor::select(["fast", "slow"]));
        ValueTypeDescriptor::structure_array(children)
    }

    #[test]
    fn well_formed_tree_passes_shape_check() {
        assert_eq!(device_schema().check_shape(), Ok(()));
    }

    #[test]
    fn select_without_options_is_rejected() {
        let mut schema = device_schema();
        if let Some(children) = schema.structure_subtypes.as_mut() {
            children.insert("broken".to_string(), ValueTypeDescriptor::leaf(ValueType::Select));
        }

        let error = schema.check_shape().err();
        assert_eq!(
            error.map(|error| (error.path, error.violation)),
            Some(("broken".to_string(), ShapeViolation::EmptySelectOptions))
        );
    }

    #[test]
    fn array_without_element_is_rejected() {
        let schema = ValueTypeDescriptor::leaf(ValueType::Array);
        let error = schema.check_shape().err();
        assert_eq!(
            error.map(|error| error.violation),
            Some(ShapeViolation::MissingArraySubType)
        );
    }

    #[test]
    fn leaf_with_children_is_rejected() {
        let mut schema = ValueTypeDescriptor::leaf(ValueType::Integer);
        schema.structure_subtypes = Some(StructureSubtypes::new());
        let error = schema.check_shape().err();
        assert_eq!(
            error.map(|error| error.violation),
            Some(ShapeViolation::UnexpectedStructureSubtypes)
        );
    }

    #[test]
    fn serialization_omits_empty_attributes() {
        let schema = ValueTypeDescriptor::leaf(ValueType::Port).with_order(3);
        let json = serde_json::to_value(&schema).unwrap_or_default();
        assert_eq!(json, serde_json::json!({ "Type": 4, "Order": 3 }));
    }

    #[test]
    fn serialization_uses_pascal_case_keys() {
        let json = serde_json::to_value(device_schema()).unwrap_or_default();
        assert_eq!(json["Type"], 9);
        assert_eq!(json["StructureSubtypes"]["tags"]["ArraySubType"]["Type"], 3);
        assert_eq!(json["StructureSubtypes"]["mode"]["Options"][1], "slow");
    }

    #[test]
    fn default_values_deserialize_by_shape() {
        let parsed: Result<ValueTypeDescriptor, _> =
            serde_json::from_str(r#"{"Type":1,"Default":20}"#);
        assert_eq!(
            parsed.ok().and_then(|schema| schema.default),
            Some(DefaultValue::Integer(20))
        );

        let parsed: Result<ValueTypeDescriptor, _> =
            serde_json::from_str(r#"{"Type":2,"Default":1.5}"#);
        assert_eq!(
            parsed.ok().and_then(|schema| schema.default),
            Some(DefaultValue::Float(1.5))
        );
    }
}

//! Schema builder.
//!
//! Walks a [`StructDefinition`] depth-first and produces the descriptor tree.
//! Primitives go through [`classify_primitive`]; structures, slices of
//! structures and slices of primitives become `Structure`, `StructureArray`
//! and `Array` nodes. Embedded fields are flattened into the enclosing map.

use crate::classify::classify_primitive;
use crate::error::DefinitionError;
use confschema_core::{
    ConfigDefinition, FieldShape, FieldTags, StructDefinition, StructureSubtypes, TagKey,
    ValueType, ValueTypeDescriptor,
};
use tracing::warn;

/// Dispatch tag marking a collection of devices.
pub const DEVICES_DISPATCH: &str = "devices";
/// Dispatch tag marking a device address field.
pub const DEVICE_IP_DISPATCH: &str = "deviceip";
/// Order assigned to device address fields without an explicit order.
pub const DEVICE_IP_ORDER: i32 = 7;

/// Build the schema of a definition type.
pub fn build_schema<T: ConfigDefinition>() -> Result<ValueTypeDescriptor, DefinitionError> {
    build_schema_for(&T::definition())
}

/// Build the schema of an explicitly registered definition.
pub fn build_schema_for(
    definition: &StructDefinition,
) -> Result<ValueTypeDescriptor, DefinitionError> {
    Ok(ValueTypeDescriptor::structure(structure_fields(definition)?))
}

/// Child descriptors of `definition`, with embedded fields flattened.
fn structure_fields(definition: &StructDefinition) -> Result<StructureSubtypes, DefinitionError> {
    let mut children = StructureSubtypes::new();
    for field in &definition.fields {
        if let (true, FieldShape::Struct(inner)) = (field.embedded, field.shape.deref_optional()) {
            for (name, child) in structure_fields(inner)? {
                insert_unique(&mut children, definition, name, child)?;
            }
            continue;
        }

        let child = field_descriptor(&field.name, &field.shape, &field.tags)?;
        insert_unique(&mut children, definition, field.name.clone(), child)?;
    }
    Ok(children)
}

fn insert_unique(
    children: &mut StructureSubtypes,
    definition: &StructDefinition,
    name: String,
    child: ValueTypeDescriptor,
) -> Result<(), DefinitionError> {
    if children.contains_key(&name) {
        return Err(DefinitionError::DuplicateField {
            field: name,
            structure: definition.name.to_string(),
        });
    }
    children.insert(name, child);
    Ok(())
}

fn field_descriptor(
    field: &str,
    shape: &FieldShape,
    tags: &FieldTags,
) -> Result<ValueTypeDescriptor, DefinitionError> {
    let mut descriptor = presentation(field, tags);

    match shape.deref_optional() {
        FieldShape::Slice(element) => match element.deref_optional() {
            FieldShape::Struct(inner) => {
                if is_device_collection(field, tags) && !inner.is_device_capable() {
                    return Err(DefinitionError::MissingDeviceCapability {
                        field: field.to_string(),
                        structure: inner.name.to_string(),
                    });
                }
                descriptor.value_type = ValueType::StructureArray;
                descriptor.structure_subtypes = Some(structure_fields(inner)?);
            },
            element => {
                descriptor.value_type = ValueType::Array;
                descriptor.array_sub_type = Some(Box::new(field_descriptor(field, element, tags)?));
            },
        },
        FieldShape::Struct(inner) => {
            let mut structure = ValueTypeDescriptor::structure(structure_fields(inner)?);
            structure.description = descriptor.description;
            structure.label = descriptor.label;
            return Ok(structure);
        },
        FieldShape::Primitive(type_name) => {
            let classification = classify_primitive(field, type_name, tags)?;
            descriptor.value_type = classification.value_type;
            descriptor.default = classification.default;
        },
        FieldShape::Optional(inner) => return field_descriptor(field, inner, tags),
    }
    Ok(descriptor)
}

fn is_device_collection(field: &str, tags: &FieldTags) -> bool {
    tags.get(TagKey::Dispatch) == Some(DEVICES_DISPATCH)
        || field.eq_ignore_ascii_case(DEVICES_DISPATCH)
}

/// Descriptor carrying the presentation tags shared by every node kind.
fn presentation(field: &str, tags: &FieldTags) -> ValueTypeDescriptor {
    let text = |key| tags.get(key).unwrap_or_default().to_string();
    let dispatch_options = tags.list(TagKey::Dispatch);

    let order = match tags.get(TagKey::Order) {
        Some(raw) => Some(raw.trim().parse::<i32>().unwrap_or_else(|error| {
            warn!(field, order = raw, %error, "malformed order, using 0");
            0
        })),
        None => dispatch_options
            .iter()
            .any(|option| option == DEVICE_IP_DISPATCH)
            .then_some(DEVICE_IP_ORDER),
    };

    ValueTypeDescriptor {
        description: text(TagKey::Description),
        label: text(TagKey::Label),
        headline: text(TagKey::Headline),
        options: tags.list(TagKey::Options),
        order,
        dispatch_options,
        required: tags.get(TagKey::Required).map(str::to_string),
        hidden: tags.get(TagKey::Hidden).map(str::to_string),
        only_on_model: model_ids(field, tags, TagKey::OnlyOnModel),
        not_on_model: model_ids(field, tags, TagKey::NotOnModel),
        ..ValueTypeDescriptor::default()
    }
}

fn model_ids(field: &str, tags: &FieldTags, key: TagKey) -> Vec<u32> {
    tags.list(key)
        .iter()
        .filter_map(|raw| match raw.trim().parse() {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(field, tag = %key, model = raw.as_str(), %error, "malformed model id, skipping");
                None
            },
        })
        .collect()
}

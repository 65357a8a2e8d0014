//! JSON Schema of the persisted descriptor format.

use confschema_core::ValueTypeDescriptor;
use schemars::{Schema, schema_for};

/// JSON Schema for `ValueTypeDescriptor`, for external UI generators.
#[must_use]
pub fn descriptor_meta_schema() -> Schema {
    schema_for!(ValueTypeDescriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_schema_describes_pascal_case_fields() {
        let schema = serde_json::to_value(descriptor_meta_schema()).unwrap_or_default();

        assert_eq!(schema["title"], "ValueTypeDescriptor");
        assert_eq!(schema["properties"]["Type"]["type"], "integer");
        assert!(schema["properties"].get("StructureSubtypes").is_some());
        assert!(schema["properties"].get("value_type").is_none());
    }
}

//! Document decoding, schema export/import, and one-shot validation.
//!
//! Decoders turn JSON or TOML text into a [`ConfigValue`]; failures surface as
//! typed `ErrorEnvelope`s like every other user-facing error.

use crate::build::build_schema;
use crate::validate::{ValidateOptions, validate_config};
use confschema_core::{ConfigDefinition, ConfigMap, ConfigValue, ValueTypeDescriptor};
use confschema_shared::{ErrorCode, ErrorEnvelope, ResultExt};
use std::path::Path;

/// Encoding of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a file extension; no extension means JSON.
    pub fn from_path(path: &Path) -> Result<Self, ErrorEnvelope> {
        let ext = path
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            None | Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some(other) => Err(ErrorEnvelope::expected(
                ErrorCode::new("config", "unsupported_format"),
                "unsupported config format; use .json or .toml",
            )
            .with_metadata("extension", other.to_string())),
        }
    }
}

/// Serialize a schema as deterministic pretty JSON (with trailing newline).
pub fn schema_to_json(schema: &ValueTypeDescriptor) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(schema).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize schema: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Build and serialize the schema of a definition type.
pub fn schema_json<T: ConfigDefinition>() -> Result<String, ErrorEnvelope> {
    let schema =
        build_schema::<T>().with_envelope_metadata("definition", std::any::type_name::<T>())?;
    schema_to_json(&schema)
}

/// Parse a persisted schema and check its shape invariants.
pub fn parse_schema_json(input: &str) -> Result<ValueTypeDescriptor, ErrorEnvelope> {
    let schema: ValueTypeDescriptor = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("schema", "invalid_json"),
            format!("invalid schema JSON: {error}"),
        )
        .with_metadata("source", "schema")
    })?;

    schema.check_shape().map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("schema", "invalid_shape"),
            format!("invalid schema: {error}"),
        )
        .with_metadata("path", error.path.clone())
        .with_metadata("type", error.value_type.as_str())
    })?;
    Ok(schema)
}

/// Decode a JSON document. Arrays stay generic lists.
pub fn parse_config_json(input: &str) -> Result<ConfigValue, ErrorEnvelope> {
    let value: serde_json::Value = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
        .with_metadata("source", "config")
    })?;
    Ok(ConfigValue::from(value))
}

/// Decode a TOML document. Arrays of tables become `ConfigValue::MapList`.
pub fn parse_config_toml(input: &str) -> Result<ConfigValue, ErrorEnvelope> {
    let table: toml::Table = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
        .with_metadata("source", "config")
    })?;
    Ok(ConfigValue::Map(toml_table(table)))
}

/// Decode `input` in the given format.
pub fn parse_config(input: &str, format: DocumentFormat) -> Result<ConfigValue, ErrorEnvelope> {
    match format {
        DocumentFormat::Json => parse_config_json(input),
        DocumentFormat::Toml => parse_config_toml(input),
    }
}

/// Decode `input` and validate it against `schema`.
pub fn validate_document(
    schema: &ValueTypeDescriptor,
    input: &str,
    format: DocumentFormat,
    options: &ValidateOptions<'_>,
) -> Result<ConfigValue, ErrorEnvelope> {
    let value = parse_config(input, format)?;
    validate_config(Some(schema), value, options).into_envelope()
}

fn toml_table(table: toml::Table) -> ConfigMap {
    table
        .into_iter()
        .map(|(key, value)| (key, toml_value(value)))
        .collect()
}

fn toml_value(value: toml::Value) -> ConfigValue {
    match value {
        toml::Value::String(value) => ConfigValue::String(value),
        toml::Value::Integer(value) => ConfigValue::Integer(value),
        toml::Value::Float(value) => ConfigValue::Float(value),
        toml::Value::Boolean(value) => ConfigValue::Bool(value),
        toml::Value::Datetime(value) => ConfigValue::String(value.to_string()),
        toml::Value::Array(items) => {
            let all_tables = !items.is_empty() && items.iter().all(toml::Value::is_table);
            if all_tables {
                ConfigValue::MapList(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            toml::Value::Table(table) => Some(toml_table(table)),
                            _ => None,
                        })
                        .collect(),
                )
            } else {
                ConfigValue::List(items.into_iter().map(toml_value).collect())
            }
        },
        toml::Value::Table(table) => ConfigValue::Map(toml_table(table)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confschema_core::{StructureSubtypes, ValueType};
    use confschema_shared::ErrorKind;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("core.TOML")).ok(),
            Some(DocumentFormat::Toml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("core")).ok(),
            Some(DocumentFormat::Json)
        );
        let error = DocumentFormat::from_path(Path::new("core.yaml")).err();
        assert_eq!(
            error.map(|e| e.code.to_string()),
            Some("config:unsupported_format".to_string())
        );
    }

    #[test]
    fn toml_arrays_of_tables_become_map_lists() {
        let value = parse_config_toml(
            "ports = [80, 443]\n\n[[devices]]\nname = \"a\"\n\n[[devices]]\nname = \"b\"\n",
        );
        let value = value.ok();
        assert_eq!(
            value.as_ref().and_then(|v| v.get("devices")).map(ConfigValue::kind_name),
            Some("list of maps")
        );
        assert_eq!(
            value.as_ref().and_then(|v| v.get("ports")).map(ConfigValue::kind_name),
            Some("list")
        );
    }

    #[test]
    fn malformed_documents_are_expected_errors() {
        let json = parse_config_json("{").err();
        assert_eq!(json.as_ref().map(|e| e.kind), Some(ErrorKind::Expected));
        assert_eq!(
            json.map(|e| e.code.to_string()),
            Some("config:invalid_json".to_string())
        );

        let toml = parse_config_toml("= 1").err();
        assert_eq!(
            toml.map(|e| e.code.to_string()),
            Some("config:invalid_toml".to_string())
        );
    }

    #[test]
    fn persisted_schema_shape_is_checked() {
        let schema = parse_schema_json(r#"{"Type":8}"#).err();
        assert_eq!(
            schema.map(|e| e.code.to_string()),
            Some("schema:invalid_shape".to_string())
        );

        let schema = parse_schema_json(r#"{"Type":8,"ArraySubType":{"Type":4}}"#);
        assert_eq!(schema.map(|s| s.value_type), Ok(ValueType::Array));
    }

    #[test]
    fn exported_schema_round_trips() {
        let mut children = StructureSubtypes::new();
        children.insert("mode".to_string(), ValueTypeDescriptor::select(["fast", "slow"]));
        let schema = ValueTypeDescriptor::structure(children);

        let json = schema_to_json(&schema).unwrap_or_default();
        assert!(json.ends_with('\n'));
        assert_eq!(parse_schema_json(&json), Ok(schema));
    }

    #[test]
    fn integral_json_numbers_fill_float_fields() {
        let mut children = StructureSubtypes::new();
        children.insert("gain".to_string(), ValueTypeDescriptor::leaf(ValueType::Float));
        let schema = ValueTypeDescriptor::structure(children);

        for (input, expected) in [
            (r#"{"gain": 2}"#, 2.0),
            (r#"{"gain": -4}"#, -4.0),
            (r#"{"gain": 2.5}"#, 2.5),
        ] {
            let cleaned = validate_document(
                &schema,
                input,
                DocumentFormat::Json,
                &ValidateOptions::default(),
            );
            assert_eq!(
                cleaned.ok().and_then(|v| v.get("gain").cloned()),
                Some(ConfigValue::Float(expected)),
                "{input}"
            );
        }
    }

    #[test]
    fn validate_document_maps_validation_errors() {
        let mut children = StructureSubtypes::new();
        children.insert("port".to_string(), ValueTypeDescriptor::leaf(ValueType::Port));
        let schema = ValueTypeDescriptor::structure(children);

        let cleaned = validate_document(
            &schema,
            "port = 8080\n",
            DocumentFormat::Toml,
            &ValidateOptions::default(),
        );
        assert_eq!(
            cleaned.ok().and_then(|v| v.get("port").cloned()),
            Some(ConfigValue::Integer(8080))
        );

        let error = validate_document(
            &schema,
            r#"{"port": 70000}"#,
            DocumentFormat::Json,
            &ValidateOptions::default(),
        )
        .err();
        assert_eq!(error.as_ref().map(|e| e.code.to_string()), Some("validation:port_out_of_range".to_string()));
        assert_eq!(error.as_ref().and_then(|e| e.metadata_value("path")), Some("port"));
    }
}

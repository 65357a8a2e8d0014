//! # confschema-config
//!
//! Derives a schema tree from a data definition and validates weakly-typed
//! value trees against it.
//!
//! - [`build_schema`] turns a `ConfigDefinition` into a `ValueTypeDescriptor`
//!   and fails with a [`DefinitionError`] on malformed definitions.
//! - [`validate_config`] checks and cleans a `ConfigValue`, failing with a
//!   path-qualified [`ValidationError`].
//! - The `load` helpers decode JSON/TOML documents and persist schemas.

/// Schema builder.
pub mod build;
/// Primitive type classification.
pub mod classify;
/// Definition-time and validation-time errors.
pub mod error;
/// Document decoding and schema persistence.
pub mod load;
/// JSON Schema of the descriptor format.
pub mod meta_schema;
/// Value-tree validation.
pub mod validate;

pub use build::{
    DEVICE_IP_DISPATCH, DEVICE_IP_ORDER, DEVICES_DISPATCH, build_schema, build_schema_for,
};
pub use classify::{Classification, classify_primitive};
pub use error::{DefinitionError, FieldPath, PathSegment, ValidationError, ValidationErrorKind};
pub use load::{
    DocumentFormat, parse_config, parse_config_json, parse_config_toml, parse_schema_json,
    schema_json, schema_to_json, validate_document,
};
pub use meta_schema::descriptor_meta_schema;
pub use validate::{UniqueIncHook, ValidateOptions, validate_config};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

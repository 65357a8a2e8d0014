//! # confschema-core
//!
//! Data model shared by the schema builder and the validator:
//!
//! - [`ValueType`] / [`ValueTypeDescriptor`] - the schema tree
//! - [`ConfigValue`] - the weakly-typed value tree being validated
//! - [`StructDefinition`] and friends - the declarative description of a
//!   configuration type, produced by `#[derive(ConfigDefinition)]`
//! - [`DeviceIdentity`] / [`BaseDeviceConfig`] - the device marker contract
//!
//! This crate has no workspace dependencies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod definition;
pub mod descriptor;
pub mod device;
pub mod value;
pub mod value_type;

pub use definition::{
    ConfigDefinition, ConfigField, FieldDefinition, FieldShape, FieldTags, StructDefinition,
    TagKey,
};
pub use descriptor::{
    DefaultValue, ShapeError, ShapeViolation, StructureSubtypes, ValueTypeDescriptor,
};
pub use device::{BaseDeviceConfig, DeviceIdentity, Embedded};
pub use value::{ConfigMap, ConfigValue};
pub use value_type::{UnknownValueType, ValueType};

/// Returns the core crate version.
#[must_use]
pub const fn core_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

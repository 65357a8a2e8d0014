//! Device marker contract.
//!
//! Elements of a `"devices"` collection must carry a device identity. The
//! capability is expressed twice: as the [`DeviceIdentity`] trait for code,
//! and as [`StructDefinition::device`] for the schema builder, which checks
//! it when building the collection's descriptor.

use crate::definition::{
    ConfigDefinition, ConfigField, FieldDefinition, FieldShape, StructDefinition,
};
use serde::{Deserialize, Serialize};

/// Identity every device configuration exposes.
pub trait DeviceIdentity {
    /// Whether the device should be connected.
    fn active(&self) -> bool;
    /// Unique, ascending device number.
    fn device_id(&self) -> u32;
    /// Model type of the device.
    fn model_id(&self) -> u32;
    /// User-chosen name.
    fn name(&self) -> &str;
    /// Free-form description.
    fn description(&self) -> &str;
}

/// Access to a field embedded (flattened) into `Self`.
///
/// Implemented by the derive macro for every `#[config(embed)]` field.
pub trait Embedded<T> {
    /// Borrow the embedded value.
    fn embedded(&self) -> &T;
}

/// Identity fields shared by all device configurations.
///
/// Embed it into a device configuration to satisfy the device contract:
///
/// ```ignore
/// #[derive(ConfigDefinition)]
/// struct CameraConfig {
///     #[config(embed)]
///     #[serde(flatten)]
///     base: BaseDeviceConfig,
///     #[config(validate = "ip")]
///     address: String,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseDeviceConfig {
    /// Whether the device should be connected.
    pub active: bool,
    /// Unique, ascending device number.
    pub device_id: u32,
    /// Model type of the device.
    pub model_id: u32,
    /// User-chosen name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl Embedded<BaseDeviceConfig> for BaseDeviceConfig {
    fn embedded(&self) -> &Self {
        self
    }
}

impl<T: Embedded<BaseDeviceConfig>> DeviceIdentity for T {
    fn active(&self) -> bool {
        self.embedded().active
    }

    fn device_id(&self) -> u32 {
        self.embedded().device_id
    }

    fn model_id(&self) -> u32 {
        self.embedded().model_id
    }

    fn name(&self) -> &str {
        &self.embedded().name
    }

    fn description(&self) -> &str {
        &self.embedded().description
    }
}

impl ConfigDefinition for BaseDeviceConfig {
    fn definition() -> StructDefinition {
        StructDefinition::new("BaseDeviceConfig")
            .field(
                FieldDefinition::new("active", bool::shape())
                    .order("1")
                    .dispatch("active")
                    .description("disable connecting to the device"),
            )
            .field(
                FieldDefinition::new("device_id", u32::shape())
                    .order("2")
                    .dispatch("deviceid")
                    .validate("unique_inc")
                    .description("unique number identifier for this device"),
            )
            .field(
                FieldDefinition::new("model_id", u32::shape())
                    .order("3")
                    .dispatch("modelid")
                    .description("the model type of the device"),
            )
            .field(
                FieldDefinition::new("name", String::shape())
                    .order("4")
                    .dispatch("name")
                    .description("choose a name of your device"),
            )
            .field(
                FieldDefinition::new("description", String::shape())
                    .order("5")
                    .dispatch("description"),
            )
            .with_device_capability()
    }
}

impl ConfigField for BaseDeviceConfig {
    fn shape() -> FieldShape {
        FieldShape::Struct(Self::definition())
    }
}

//! Data definitions shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use confschema_core::BaseDeviceConfig;
use confschema_derive::ConfigDefinition;
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, ConfigDefinition)]
#[config(device)]
pub struct CameraConfig {
    #[config(embed)]
    #[serde(flatten)]
    pub base: BaseDeviceConfig,
    #[config(validate = "ip", dispatch = "deviceip", description = "address of the camera")]
    pub ip: String,
    #[config(validate = "port", order = 8, default = "9910")]
    pub port: u16,
    #[config(options = "auto,manual", default = "auto", label = "Iris mode")]
    #[serde(default)]
    pub iris: String,
    #[config(validate = "password")]
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, ConfigDefinition)]
pub struct NetworkConfig {
    #[config(description = "poll interval in seconds", default = "1.5")]
    pub interval: f64,
    #[config(default = "true")]
    pub discovery: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, ConfigDefinition)]
pub struct PresetConfig {
    #[config(validate = "unique_inc", default = "3")]
    pub id: u32,
    pub name: String,
    #[config(only_on_model = "2,3", not_on_model = "5", required = "true", hidden = "false")]
    pub shutter: Option<i32>,
}

#[derive(Debug, Deserialize, ConfigDefinition)]
pub struct CoreConfig {
    #[config(label = "Network")]
    pub network: NetworkConfig,
    #[config(dispatch = "devices", headline = "Devices")]
    pub devices: Vec<CameraConfig>,
    pub presets: Vec<PresetConfig>,
    #[config(rename = "log_level", options = "error,warn,info,debug", default = "warn")]
    #[serde(rename = "log_level")]
    pub level: String,
    #[config(skip)]
    #[serde(skip)]
    pub runtime_token: String,
}

pub fn read_fixture(name: &str) -> Result<String, Box<dyn Error>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    Ok(fs::read_to_string(path)?)
}

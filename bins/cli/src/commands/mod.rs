//! CLI command handlers.

mod info;
mod inspect;
mod meta_schema;
mod validate;

pub use info::run_info;
pub use inspect::run_inspect;
pub use meta_schema::run_meta_schema;
pub use validate::{ValidateCommandInput, run_validate};

use crate::error::CliError;
use confschema_config::parse_schema_json;
use confschema_core::ValueTypeDescriptor;
use confschema_shared::ErrorEnvelope;
use std::path::Path;

/// Read a file, mapping failures to `CliError::Io`.
pub(crate) fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|error| CliError::read(path, error))
}

/// Read and shape-check a persisted schema.
pub(crate) fn load_schema(path: &Path) -> Result<Result<ValueTypeDescriptor, ErrorEnvelope>, CliError> {
    let input = read_file(path)?;
    Ok(parse_schema_json(&input)
        .map_err(|error| error.with_metadata("schemaPath", path.to_string_lossy())))
}

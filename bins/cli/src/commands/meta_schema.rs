//! Meta-schema command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::to_pretty_json;
use confschema_config::descriptor_meta_schema;

/// Print the JSON Schema of the descriptor format.
///
/// The output is always JSON, regardless of `--output`.
pub fn run_meta_schema() -> Result<CliOutput, CliError> {
    let schema = serde_json::to_value(descriptor_meta_schema())?;
    Ok(CliOutput {
        stdout: to_pretty_json(&schema)?,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

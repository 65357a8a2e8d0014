//! Validate command handler.

use super::{load_schema, read_file};
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_pretty_json};
use crate::{CliOutput, format_error_output, log_info};
use confschema_config::{DocumentFormat, ValidateOptions, validate_document};
use confschema_core::ConfigValue;
use std::path::Path;

/// Inputs for the validate command.
pub struct ValidateCommandInput<'a> {
    pub schema: &'a Path,
    pub config: &'a Path,
    pub strict: bool,
    pub source: Option<&'a str>,
}

/// Validate a config document against a persisted schema.
pub fn run_validate(
    mode: OutputMode,
    input: &ValidateCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let mut stderr = String::new();
    let schema = match load_schema(input.schema)? {
        Ok(schema) => schema,
        Err(error) => return format_error_output(mode, &error),
    };
    let format = match DocumentFormat::from_path(input.config) {
        Ok(format) => format,
        Err(error) => return format_error_output(mode, &error),
    };
    let document = read_file(input.config)?;

    let source = input
        .source
        .map_or_else(|| input.config.to_string_lossy().to_string(), str::to_string);
    let options = ValidateOptions {
        strict: input.strict,
        ..ValidateOptions::default()
    }
    .with_source(&source);

    log_info(
        &mut stderr,
        &format!("validating {source} ({})", if input.strict { "strict" } else { "lenient" }),
        mode.no_progress,
    );
    tracing::debug!(schema = %input.schema.display(), config = %source, ?format, "validating document");

    let cleaned = match validate_document(&schema, &document, format, &options) {
        Ok(cleaned) => cleaned,
        Err(error) => {
            let mut output = format_error_output(mode, &error)?;
            output.stderr.insert_str(0, &stderr);
            return Ok(output);
        },
    };

    let stdout = if mode.is_json() {
        to_pretty_json(&serde_json::json!({
            "status": "ok",
            "source": source,
            "strict": input.strict,
            "config": cleaned.to_json(),
        }))?
    } else {
        format_validate_text(&source, input.strict, &cleaned)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn format_validate_text(source: &str, strict: bool, cleaned: &ConfigValue) -> String {
    let fields = match cleaned {
        ConfigValue::Map(map) => map.len(),
        _ => 0,
    };
    format!(
        "status: ok\nsource: {source}\nmode: {}\nfields: {fields}\n",
        if strict { "strict" } else { "lenient" }
    )
}

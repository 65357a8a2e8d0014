//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{ValidateCommandInput, run_info, run_inspect, run_meta_schema, run_validate};
use confschema_shared::{ErrorEnvelope, ErrorKind};
use error::{CliError, ExitCode};
use format::{LogFormat, OutputArgs, OutputMode, to_pretty_json};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CONFSCHEMA_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "confschema",
    version,
    about = "Validate configuration documents against confschema schemas",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build and version details.
    Info,
    /// Validate and clean a config document (JSON/TOML) against a persisted schema.
    Validate {
        /// Schema file produced by `schema_json`.
        #[arg(long)]
        schema: PathBuf,
        /// Config document; the format follows the extension (`.json`, `.toml`).
        #[arg(long)]
        config: PathBuf,
        /// Reject keys that have no schema node.
        #[arg(long)]
        strict: bool,
        /// Document name used in diagnostics (defaults to the config path).
        #[arg(long)]
        source: Option<String>,
    },
    /// Print a persisted schema as a tree.
    Inspect {
        /// Schema file produced by `schema_json`.
        #[arg(long)]
        schema: PathBuf,
    },
    /// Print the JSON Schema of the schema file format.
    MetaSchema,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.output.log_format);
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    let installed = match format {
        LogFormat::Text => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = installed {
        eprintln!("warning: diagnostics disabled: {error}");
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Info => run_info(mode),
        Commands::Validate {
            schema,
            config,
            strict,
            source,
        } => run_validate(
            mode,
            &ValidateCommandInput {
                schema,
                config,
                strict: *strict,
                source: source.as_deref(),
            },
        ),
        Commands::Inspect { schema } => run_inspect(mode, schema),
        Commands::MetaSchema => run_meta_schema(),
    }
}

/// Exit code for a library error: rejected input is the caller's problem,
/// anything unexpected is ours.
pub(crate) const fn envelope_exit_code(error: &ErrorEnvelope) -> ExitCode {
    match error.kind {
        ErrorKind::Expected | ErrorKind::Invariant => ExitCode::InvalidInput,
        ErrorKind::Unexpected => ExitCode::Internal,
    }
}

pub(crate) fn format_error_output(
    mode: OutputMode,
    error: &ErrorEnvelope,
) -> Result<CliOutput, CliError> {
    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_json() {
        to_pretty_json(&serde_json::json!({
            "status": "error",
            "error": {
                "code": error.code.to_string(),
                "kind": error.kind.to_string(),
                "message": error.message,
                "metadata": error.metadata,
            },
        }))?
    } else {
        format_error_text(error)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: envelope_exit_code(error),
    })
}

fn format_error_text(error: &ErrorEnvelope) -> String {
    let mut output = format!(
        "status: error\ncode: {}\nkind: {}\nmessage: {}\n",
        error.code, error.kind, error.message
    );
    for (key, value) in &error.metadata {
        output.push_str(key);
        output.push_str(": ");
        output.push_str(value);
        output.push('\n');
    }
    output
}

fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

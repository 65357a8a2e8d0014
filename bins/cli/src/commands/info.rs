//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_pretty_json};
use confschema_config::config_crate_version;
use confschema_core::core_crate_version;
use confschema_shared::shared_crate_version;

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let stdout = if mode.is_json() {
        to_pretty_json(&serde_json::json!({
            "status": "ok",
            "build": {
                "name": name,
                "version": version,
                "configVersion": config_crate_version(),
                "coreVersion": core_crate_version(),
                "sharedVersion": shared_crate_version(),
            }
        }))?
    } else {
        format!(
            "status: ok\nname: {name}\nversion: {version}\nconfig: {}\ncore: {}\nshared: {}\n",
            config_crate_version(),
            core_crate_version(),
            shared_crate_version(),
        )
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

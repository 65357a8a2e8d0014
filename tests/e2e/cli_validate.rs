//! CLI E2E tests for validating fixture documents.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map_or_else(|| manifest_dir.to_path_buf(), Path::to_path_buf)
        .join("crates/config/tests/fixtures")
        .join(name)
}

fn confschema(args: &[&str]) -> io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_confschema"))
        .args(args)
        .env_remove("CONFSCHEMA_LOG")
        .output()
}

fn validate_json(config: &str, extra: &[&str]) -> io::Result<(Option<i32>, serde_json::Value)> {
    let schema = fixture("core.schema.json");
    let config = fixture(config);
    let mut args = vec![
        "--output",
        "json",
        "--no-progress",
        "validate",
        "--schema",
        schema.to_str().unwrap_or_default(),
        "--config",
        config.to_str().unwrap_or_default(),
    ];
    args.extend_from_slice(extra);

    let output = confschema(&args)?;
    let payload = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    Ok((output.status.code(), payload))
}

#[test]
fn valid_toml_document_is_cleaned() -> io::Result<()> {
    let (code, payload) = validate_json("core.valid.toml", &["--strict"])?;

    assert_eq!(code, Some(0));
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["config"]["devices"][1]["port"], 9911);
    assert_eq!(payload["config"]["log_level"], "info");
    Ok(())
}

#[test]
fn out_of_range_port_exits_with_invalid_input() -> io::Result<()> {
    let (code, payload) = validate_json("core.invalid-port.json", &[])?;

    assert_eq!(code, Some(2));
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error"]["code"], "validation:port_out_of_range");
    assert_eq!(payload["error"]["metadata"]["path"], "devices[1].port");
    Ok(())
}

#[test]
fn unknown_key_is_rejected_only_in_strict_mode() -> io::Result<()> {
    let (strict_code, strict) = validate_json("core.unknown-key.json", &["--strict"])?;
    assert_eq!(strict_code, Some(2));
    assert_eq!(strict["error"]["code"], "validation:unknown_field");

    let (lenient_code, lenient) = validate_json("core.unknown-key.json", &[])?;
    assert_eq!(lenient_code, Some(0));
    assert_eq!(lenient["config"]["legacy_mode"], true);
    Ok(())
}

#[test]
fn meta_schema_is_printed_as_json() -> io::Result<()> {
    let output = confschema(&["meta-schema"])?;
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;

    assert!(output.status.success());
    assert_eq!(payload["title"], "ValueTypeDescriptor");
    Ok(())
}

#[test]
fn inspect_lists_device_fields() -> io::Result<()> {
    let schema = fixture("core.schema.json");
    let output = confschema(&["inspect", "--schema", schema.to_str().unwrap_or_default()])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.starts_with("status: ok\ntype: structure\n"));
    assert!(stdout.contains("  devices: structure array"));
    assert!(stdout.contains("    port: port order=8"));
    Ok(())
}

#[test]
fn missing_schema_file_exits_with_io_code() -> io::Result<()> {
    let output = confschema(&[
        "inspect",
        "--schema",
        "does-not-exist.schema.json",
    ])?;

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: failed to read"));
    Ok(())
}

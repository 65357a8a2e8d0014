//! Inspect command handler.

use super::load_schema;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_pretty_json};
use crate::{CliOutput, format_error_output};
use confschema_core::ValueTypeDescriptor;
use std::path::Path;

/// Render a persisted schema as an indented tree (text) or as JSON.
pub fn run_inspect(mode: OutputMode, schema_path: &Path) -> Result<CliOutput, CliError> {
    let schema = match load_schema(schema_path)? {
        Ok(schema) => schema,
        Err(error) => return format_error_output(mode, &error),
    };

    let stdout = if mode.is_json() {
        to_pretty_json(&serde_json::json!({
            "status": "ok",
            "schema": serde_json::to_value(&schema)?,
        }))?
    } else {
        let mut output = format!("status: ok\ntype: {}\n", schema.value_type);
        render_children(&mut output, &schema, 0);
        output
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn render_children(output: &mut String, node: &ValueTypeDescriptor, depth: usize) {
    if let Some(element) = node.array_sub_type.as_deref() {
        render_node(output, "[]", element, depth);
    }
    let Some(children) = node.structure_subtypes.as_ref() else {
        return;
    };
    let mut ordered: Vec<_> = children.iter().collect();
    ordered.sort_by_key(|(name, child)| (child.order.unwrap_or(i32::MAX), name.as_str()));
    for (name, child) in ordered {
        render_node(output, name, child, depth);
    }
}

fn render_node(output: &mut String, name: &str, node: &ValueTypeDescriptor, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    output.push_str(&format!("{indent}{name}: {}", node.value_type));
    if let Some(order) = node.order {
        output.push_str(&format!(" order={order}"));
    }
    if !node.options.is_empty() {
        output.push_str(" options=");
        output.push_str(&node.options.join("|"));
    }
    if !node.dispatch_options.is_empty() {
        output.push_str(" dispatch=");
        output.push_str(&node.dispatch_options.join(","));
    }
    if node.default.is_some() {
        output.push_str(" default");
    }
    output.push('\n');
    render_children(output, node, depth + 1);
}

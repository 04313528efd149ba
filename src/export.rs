// Author: Dustin Pilgrim
// License: MIT

use serde_json::json;

use crate::config::RootConfig;
use crate::diagnostics::{Diagnostics, Severity};
use crate::ConfigError;

fn export_error(e: serde_json::Error) -> ConfigError {
    ConfigError::FileError {
        message: format!("Failed to export to JSON: {}", e),
        path: "<json>".into(),
        hint: None,
        code: Some(500),
    }
}

/// Export a resolved configuration to pretty JSON.
///
/// - Variable values, provider payloads → plain JSON (unknown values become null)
/// - Variable types → friendly names such as `"list of string"`
/// - Schema formats → nested `{"type", "required", "key" | "fields" | "inner"}` objects
///
/// # Examples
/// ```no_run
/// use switchboard_cfg::{export, Pipeline};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Pipeline::new(".", "variables.json", "development").parse()?;
/// println!("{}", export::export_config_to_json(&config)?);
/// # Ok(())
/// # }
/// ```
pub fn export_config_to_json(config: &RootConfig) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(config).map_err(export_error)
}

/// Export diagnostics as a JSON array of `{severity, summary, detail, subject}` objects.
pub fn export_diagnostics_to_json(diags: &Diagnostics) -> Result<String, ConfigError> {
    let entries: Vec<serde_json::Value> = diags
        .iter()
        .map(|d| {
            json!({
                "severity": match d.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                },
                "summary": d.summary,
                "detail": d.detail,
                "subject": d.subject.as_ref().map(|pos| json!({
                    "file": pos.file,
                    "line": pos.line,
                    "column": pos.column,
                })),
            })
        })
        .collect();
    serde_json::to_string_pretty(&entries).map_err(export_error)
}

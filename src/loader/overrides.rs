use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::value::Value;
use crate::ConfigError;

/// Read variable overrides from a JSON object file.
///
/// A missing file is not an error: it is logged and yields no overrides.
/// JSON `null` entries count as absent.
pub fn load_overrides<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, Value>, ConfigError> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().to_string();

    if !path.exists() {
        warn!(path = %path_str, "could not open json file with variable overrides");
        return Ok(IndexMap::new());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::OverrideError {
        message: format!("Failed to read file: {}", e),
        path: path_str.clone(),
        hint: Some("Check that the file is readable".into()),
        code: Some(310),
    })?;

    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| ConfigError::OverrideError {
        message: format!("Failed to decode variables: {}", e),
        path: path_str.clone(),
        hint: Some("The file must contain valid JSON".into()),
        code: Some(311),
    })?;

    let serde_json::Value::Object(entries) = json else {
        return Err(ConfigError::OverrideError {
            message: "JSON file must be in object format (key/val)".into(),
            path: path_str,
            hint: Some("Use an object such as {\"service_user\": \"joe\"}".into()),
            code: Some(312),
        });
    };

    let overrides: IndexMap<String, Value> = entries
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), Value::from_json(v)))
        .collect();
    debug!(path = %path_str, count = overrides.len(), "variable overrides loaded");
    Ok(overrides)
}

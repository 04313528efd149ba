// Author: Dustin Pilgrim
// License: MIT

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Package name of a provider source: its last path segment.
pub fn package_name(source: &str) -> &str {
    source.trim_end_matches('/').rsplit('/').next().unwrap_or(source)
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `base.key`, or just `key` at the root.
pub fn join_key_path(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", base, key)
    }
}

/// Expand "~/" and resolve relative paths against base_dir.
pub fn resolve_path(raw_path: &str, base_dir: &Path) -> Result<PathBuf, ConfigError> {
    let mut p = if let Some(rest) = raw_path.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| ConfigError::FileError {
            message: "Could not determine home directory for ~ expansion".into(),
            path: raw_path.to_string(),
            hint: Some("Set HOME or use an absolute path".into()),
            code: Some(300),
        })?;
        home.join(rest)
    } else {
        PathBuf::from(raw_path)
    };

    if p.is_relative() {
        p = base_dir.join(p);
    }
    Ok(p)
}

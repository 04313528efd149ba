// Author: Dustin Pilgrim
// License: MIT

//! Loading configuration files from disk into one merged [`Document`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ast::{Body, Document};
use crate::parser::Parser;
use crate::ConfigError;

mod overrides;

pub use overrides::load_overrides;

pub const CONFIG_EXTENSION: &str = "hcl";

/// Parse every `.hcl` file below `root`, nested directories included, and merge
/// them in path order.
pub fn load_dir<P: AsRef<Path>>(root: P) -> Result<Document, ConfigError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(ConfigError::FileError {
            message: "Configuration directory does not exist".into(),
            path: root.to_string_lossy().to_string(),
            hint: Some("Pass an existing directory with --dir".into()),
            code: Some(301),
        });
    }

    let mut files = Vec::new();
    collect_config_files(root, &mut files)?;
    files.sort();

    let mut document = Document::default();
    for path in files {
        let name = path.to_string_lossy().to_string();
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileError {
            message: format!("Failed to read file: {}", e),
            path: name.clone(),
            hint: Some("Check that the file exists and is readable".into()),
            code: Some(301),
        })?;
        debug!(file = %name, "parsing configuration file");
        let body = Parser::new(name.clone(), &content)?.parse_body()?;
        merge_into(&mut document, name, body)?;
    }

    debug!(files = document.files.len(), root = %root.display(), "configuration loaded");
    Ok(document)
}

/// Parse a single in-memory file.
pub fn load_str(name: &str, content: &str) -> Result<Document, ConfigError> {
    let body = Parser::new(name, content)?.parse_body()?;
    let mut document = Document::default();
    merge_into(&mut document, name.to_string(), body)?;
    Ok(document)
}

fn collect_config_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ConfigError> {
    let entries = fs::read_dir(dir).map_err(|e| ConfigError::FileError {
        message: format!("Failed to read directory: {}", e),
        path: dir.to_string_lossy().to_string(),
        hint: None,
        code: Some(302),
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| ConfigError::FileError {
                message: format!("Failed to read directory entry: {}", e),
                path: dir.to_string_lossy().to_string(),
                hint: None,
                code: Some(302),
            })?
            .path();
        if path.is_dir() {
            collect_config_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == CONFIG_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

// Attributes merge by name and may only be defined once; blocks are appended.
fn merge_into(document: &mut Document, file: String, body: Body) -> Result<(), ConfigError> {
    if document.files.is_empty() {
        document.body.pos = body.pos.clone();
    }
    for (name, attr) in body.attributes {
        if let Some(existing) = document.body.attributes.get(&name) {
            return Err(ConfigError::SyntaxError {
                message: format!("Attribute '{}' redefined", name),
                file: attr.pos.file.clone(),
                line: attr.pos.line,
                column: attr.pos.column,
                hint: Some(format!("First defined at {}", existing.pos)),
                code: Some(215),
            });
        }
        document.body.attributes.insert(name, attr);
    }
    document.body.blocks.extend(body.blocks);
    document.files.push(file);
    Ok(())
}

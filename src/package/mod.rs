// Author: Dustin Pilgrim
// License: MIT

//! Provider packages: what is cached locally and how missing ones are fetched.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::RequiredProvider;

mod cache;
mod fetch;

pub use cache::PackageCache;
pub use fetch::{dist_name, release_url, ArchiveFormat};

/// Cache root, relative to the working directory.
pub const PACKAGE_ROOT: &str = ".switchboard/packages";
/// File name of a provider executable inside its package directory.
pub const PLUGIN_BINARY: &str = "switchboard_plugin";

/// Identity of a cached package: the last segment of its source plus its version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Package {
    pub name: String,
    pub version: String,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn of(provider: &RequiredProvider) -> Self {
        Self::new(provider.package_name(), provider.version.clone())
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{0}' is not a supported OS")]
    UnsupportedOs(String),
    #[error("unsupported architecture: {0}")]
    UnsupportedArch(String),
    #[error("could not fetch '{url}': {message}")]
    Fetch { url: String, message: String },
    #[error("could not unpack '{}': {message}", path.display())]
    Archive { path: PathBuf, message: String },
    #[error("package '{}' does not contain a switchboard_plugin executable", path.display())]
    MissingBinary { path: PathBuf },
    #[error("downloads are not available in this build")]
    Disabled,
}

/// Local package cache as seen by the switchboard stage.
pub trait Downloader {
    /// Create the cache root if it does not exist yet.
    fn ensure_package_root(&self) -> Result<(), DownloadError>;
    fn downloaded_providers(&self) -> Result<Vec<Package>, DownloadError>;
    fn download_provider(&self, source: &str, version: &str) -> Result<(), DownloadError>;
}

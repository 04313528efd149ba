use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::fetch::{dist_name, fetch_to, release_url, unpack, ArchiveFormat};
use super::{DownloadError, Downloader, Package, PACKAGE_ROOT, PLUGIN_BINARY};

/// Package cache on disk: `<root>/<source>/<version>/switchboard_plugin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCache {
    root: PathBuf,
    os: String,
    arch: String,
}

impl PackageCache {
    /// Cache under `working_dir`, for the platform this binary runs on.
    pub fn new(working_dir: &Path) -> Self {
        Self::with_root(working_dir.join(PACKAGE_ROOT))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    pub fn with_platform(mut self, os: &str, arch: &str) -> Self {
        self.os = os.to_string();
        self.arch = arch.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_path(&self, source: &str, version: &str) -> PathBuf {
        self.root.join(source.trim_end_matches('/')).join(version)
    }

    pub fn plugin_path(&self, source: &str, version: &str) -> PathBuf {
        self.package_path(source, version).join(PLUGIN_BINARY)
    }

    /// Unpack a downloaded release archive into `package_dir` and drop the archive.
    /// The package must end up with an executable plugin binary.
    pub(crate) fn install(&self, archive: &Path, package_dir: &Path) -> Result<(), DownloadError> {
        unpack(archive, ArchiveFormat::for_os(&self.os), package_dir)?;
        fs::remove_file(archive).map_err(|source| DownloadError::Io {
            action: "could not remove",
            path: archive.to_path_buf(),
            source,
        })?;

        let binary = package_dir.join(PLUGIN_BINARY);
        if !binary.is_file() {
            return Err(DownloadError::MissingBinary {
                path: package_dir.to_path_buf(),
            });
        }
        mark_executable(&binary)
    }

    fn collect_packages(&self, dir: &Path, out: &mut Vec<Package>) -> Result<(), DownloadError> {
        let entries = fs::read_dir(dir).map_err(|source| DownloadError::Io {
            action: "could not read",
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let path = entry
                .map_err(|source| DownloadError::Io {
                    action: "could not read",
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            if path.is_dir() {
                self.collect_packages(&path, out)?;
                continue;
            }

            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            if segments.len() >= 3 {
                let n = segments.len();
                out.push(Package::new(segments[n - 3].clone(), segments[n - 2].clone()));
            }
        }
        Ok(())
    }
}

impl Downloader for PackageCache {
    fn ensure_package_root(&self) -> Result<(), DownloadError> {
        fs::create_dir_all(&self.root).map_err(|source| DownloadError::Io {
            action: "could not create directory",
            path: self.root.clone(),
            source,
        })
    }

    fn downloaded_providers(&self) -> Result<Vec<Package>, DownloadError> {
        let mut packages = Vec::new();
        self.collect_packages(&self.root, &mut packages)?;
        packages.sort_by(|a, b| (&a.name, &a.version).cmp(&(&b.name, &b.version)));
        packages.dedup();
        debug!(count = packages.len(), root = %self.root.display(), "listed cached packages");
        Ok(packages)
    }

    fn download_provider(&self, source: &str, version: &str) -> Result<(), DownloadError> {
        let asset = dist_name(source, &self.os, &self.arch)?;
        let url = release_url(source, version, &asset);
        let package_dir = self.package_path(source, version);

        fs::create_dir_all(&package_dir).map_err(|e| DownloadError::Io {
            action: "could not create directory",
            path: package_dir.clone(),
            source: e,
        })?;

        info!(%url, "downloading provider {}@{}", source, version);
        let archive = package_dir.join(&asset);
        let binary = package_dir.join(PLUGIN_BINARY);
        let result = fetch_to(&url, &archive).and_then(|()| self.install(&archive, &package_dir));
        if let Err(err) = result {
            if let Err(remove_err) = fs::remove_dir_all(&package_dir) {
                warn!(
                    path = %package_dir.display(),
                    "could not remove partial package, clear out the package cache and try again: {}",
                    remove_err
                );
            }
            return Err(err);
        }

        info!(path = %binary.display(), "provider {}@{} downloaded", source, version);
        Ok(())
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), DownloadError> {
    use std::os::unix::fs::PermissionsExt;

    let io_err = |source| DownloadError::Io {
        action: "could not set permissions on",
        path: path.to_path_buf(),
        source,
    };
    let mut permissions = fs::metadata(path).map_err(io_err)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions).map_err(io_err)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), DownloadError> {
    Ok(())
}

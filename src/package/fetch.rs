use std::fs::File;
use std::path::Path;

use crate::utils::{capitalize_first, package_name};

use super::DownloadError;

/// Packaging of a release asset. Windows releases ship as zip, everything else as tar.gz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    pub fn for_os(os: &str) -> Self {
        if os == "windows" { ArchiveFormat::Zip } else { ArchiveFormat::TarGz }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Release asset name for `source` on the given platform, e.g. `provider-aws_Linux_x86_64.tar.gz`.
///
/// `os` and `arch` are the values of `std::env::consts`.
pub fn dist_name(source: &str, os: &str, arch: &str) -> Result<String, DownloadError> {
    let os_name = match os {
        "linux" | "windows" => os,
        "macos" | "darwin" => "darwin",
        other => return Err(DownloadError::UnsupportedOs(other.to_string())),
    };
    let arch_name = match arch {
        "x86_64" | "amd64" => "x86_64",
        "x86" | "386" => "i386",
        "aarch64" | "arm64" => "arm64",
        other => return Err(DownloadError::UnsupportedArch(other.to_string())),
    };
    Ok(format!(
        "{}_{}_{}.{}",
        package_name(source),
        capitalize_first(os_name),
        arch_name,
        ArchiveFormat::for_os(os_name).extension()
    ))
}

/// `https://<source>/releases/download/v<version>/<asset>`
pub fn release_url(source: &str, version: &str, asset: &str) -> String {
    format!("https://{}/releases/download/v{}/{}", source.trim_end_matches('/'), version, asset)
}

#[cfg(feature = "download")]
pub(crate) fn fetch_to(url: &str, dest: &Path) -> Result<(), DownloadError> {
    use std::io;

    let agent = ureq::Agent::new_with_defaults();
    let response = agent.get(url).call().map_err(|e| DownloadError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let mut reader = response.into_body().into_reader();
    let mut file = File::create(dest).map_err(|source| DownloadError::Io {
        action: "could not create",
        path: dest.to_path_buf(),
        source,
    })?;
    io::copy(&mut reader, &mut file).map_err(|source| DownloadError::Io {
        action: "could not write",
        path: dest.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(not(feature = "download"))]
pub(crate) fn fetch_to(_url: &str, _dest: &Path) -> Result<(), DownloadError> {
    Err(DownloadError::Disabled)
}

/// Unpack `archive` into `dest`, which must already exist.
pub(crate) fn unpack(archive: &Path, format: ArchiveFormat, dest: &Path) -> Result<(), DownloadError> {
    let file = File::open(archive).map_err(|source| DownloadError::Io {
        action: "could not open",
        path: archive.to_path_buf(),
        source,
    })?;
    let archive_err = |message: String| DownloadError::Archive {
        path: archive.to_path_buf(),
        message,
    };

    match format {
        ArchiveFormat::TarGz => {
            let gz = flate2::read::GzDecoder::new(file);
            tar::Archive::new(gz)
                .unpack(dest)
                .map_err(|e| archive_err(e.to_string()))
        }
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(file).map_err(|e| archive_err(e.to_string()))?;
            zip.extract(dest).map_err(|e| archive_err(e.to_string()))
        }
    }
}

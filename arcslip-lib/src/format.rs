use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{BuildError, Result};

/// Container written for a given output name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchiveFormat {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "jar")]
    Jar,
    #[serde(rename = "tar")]
    Tar,
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.bz2")]
    TarBz2,
}

impl ArchiveFormat {
    /// Picks the format from the last extension of `output`, ignoring case.
    ///
    /// `x.tar.gz`, `x.tgz` and a bare `x.gz` all give [`ArchiveFormat::TarGz`].
    /// There is no fallback: anything unrecognised is an error.
    pub fn from_output_name(output: &Path) -> Result<Self> {
        let ext = output
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "jar" => Ok(ArchiveFormat::Jar),
            "tar" => Ok(ArchiveFormat::Tar),
            "gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            "bz2" => Ok(ArchiveFormat::TarBz2),
            "" => Err(BuildError::UnsupportedFormat("(none)".to_string())),
            other => Err(BuildError::UnsupportedFormat(format!(".{other}"))),
        }
    }

    /// Zip and jar share one container.
    pub fn is_zip_style(self) -> bool {
        matches!(self, ArchiveFormat::Zip | ArchiveFormat::Jar)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Jar => "jar",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarBz2 => "tar.bz2",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

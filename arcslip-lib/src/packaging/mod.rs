use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use tokio::fs::File;
use tokio::runtime::Builder;
use tokio::task;
use tracing::{debug, info, warn};

use crate::BuildRequest;
use crate::error::Result;
use crate::format::ArchiveFormat;
use crate::naming::{TraversalPath, prepare_entries};

pub mod tar;
pub mod zip;

/// Represents a file to include in the archive.
///
/// `name_in_archive` holds the exact bytes written as the entry name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_lossy")]
    pub name_in_archive: Vec<u8>,
}

impl FileEntry {
    /// Name for logs and listings. Invalid UTF-8 shows up as U+FFFD here only;
    /// the archive always gets the raw bytes.
    pub fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name_in_archive)
    }
}

fn serialize_lossy<S: Serializer>(name: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(name))
}

/// Compression used for zip-style entries. Tar variants ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compressor {
    Deflate,
    #[default]
    Stored,
}

/// Everything needed to write one archive, resolved up front so nothing is
/// opened for writing until the format and all names are known.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub format: ArchiveFormat,
    pub output: PathBuf,
    pub compressor: Compressor,
    pub traversal: TraversalPath,
    pub entries: Vec<FileEntry>,
}

impl BuildPlan {
    pub fn from_request(request: &BuildRequest) -> Result<Self> {
        let format = ArchiveFormat::from_output_name(&request.output)?;
        let traversal = TraversalPath::new(request.traversal.as_str());
        let entries = prepare_entries(&request.files, &request.target, &traversal);

        Ok(Self {
            format,
            output: request.output.clone(),
            compressor: if request.compress {
                Compressor::Deflate
            } else {
                Compressor::Stored
            },
            traversal,
            entries,
        })
    }
}

/// What a finished build wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub format: ArchiveFormat,
    pub output: PathBuf,
    /// Raw entry names, in archive order.
    pub names: Vec<Vec<u8>>,
}

/// Writes the archive described by `plan`, managing its own async runtime.
///
/// This is the main entrypoint for synchronous callers. Must not be called
/// from inside another tokio runtime.
pub fn build_archive_sync(plan: BuildPlan) -> Result<BuildSummary> {
    // 1. Build a tokio runtime.
    // `new_current_thread` keeps the build on the caller's thread; only the
    // blocking pool is used for the tar encoders.
    // `enable_all` is required for the fs driver.
    let rt = Builder::new_current_thread().enable_all().build()?;

    // 2. Run the build to completion on the runtime.
    // `block_on` blocks the current thread until the archive is closed
    // or the first error comes back.
    rt.block_on(build_archive(plan))
}

/// Writes the archive described by `plan`.
///
/// Entries go in plan order. A failure part way leaves whatever was already
/// written on disk.
pub async fn build_archive(plan: BuildPlan) -> Result<BuildSummary> {
    let BuildPlan {
        format,
        output,
        compressor,
        entries,
        ..
    } = plan;

    info!(
        output = %output.display(),
        %format,
        entries = entries.len(),
        "building archive"
    );

    // Open: the output is created only now, after format and names are settled.
    let mut file = create_file_writer(&output).await?;

    if format.is_zip_style() {
        // async_zip drives the tokio file directly.
        zip::write_zip(&mut file, &entries, compressor).await?;
    } else {
        // The tar, gzip and bzip2 encoders are synchronous, so hand them a
        // std file and run them on tokio's blocking thread pool.
        // `into_std` waits for any in-flight tokio operation on the file first.
        let file = file.into_std().await;
        let tar_entries = entries.clone();

        // The outer `?` is a panicked or cancelled task, the inner one a
        // write failure. Either way the file handle has been dropped by now.
        task::spawn_blocking(move || tar::write_tar(file, format, &tar_entries)).await??;
    }

    debug!(output = %output.display(), "archive closed");

    Ok(BuildSummary {
        format,
        output,
        names: entries.into_iter().map(|e| e.name_in_archive).collect(),
    })
}

/// Creates (or truncates) the output file.
/// Automatically creates parent directories if they don't exist.
async fn create_file_writer(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    if tokio::fs::metadata(path).await.is_ok() {
        warn!(output = %path.display(), "replacing existing archive");
    }

    Ok(File::create(path).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dir: &Path, output: &str) -> BuildRequest {
        let a = dir.join("a.txt");
        let b = dir.join("b.txt");
        std::fs::write(&a, "alpha").unwrap();
        std::fs::write(&b, "beta").unwrap();
        BuildRequest {
            files: vec![a.clone(), b],
            target: a,
            traversal: "../../tmp/evil".to_string(),
            output: dir.join(output),
            compress: false,
        }
    }

    #[test]
    fn plan_resolves_format_and_names() {
        let dir = tempfile::tempdir().unwrap();
        let plan = BuildPlan::from_request(&request(dir.path(), "x.zip")).unwrap();

        assert_eq!(plan.format, ArchiveFormat::Zip);
        assert_eq!(plan.compressor, Compressor::Stored);
        let names: Vec<_> = plan.entries.iter().map(|e| e.display_name()).collect();
        assert_eq!(names, ["../../tmp/evil/a.txt", "b.txt"]);
    }

    #[test]
    fn plan_rejects_unknown_format_without_creating_output() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "x.rar");
        assert!(BuildPlan::from_request(&req).is_err());
        assert!(!req.output.exists());
    }

    #[test]
    fn dry_run_listing_shows_names_as_text() {
        let entry = FileEntry {
            path: PathBuf::from("a.txt"),
            name_in_archive: b"../x/a.txt".to_vec(),
        };
        assert_eq!(entry.display_name(), "../x/a.txt");
    }

    #[test]
    fn compress_flag_selects_deflate() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), "x.jar");
        req.compress = true;
        let plan = BuildPlan::from_request(&req).unwrap();
        assert_eq!(plan.compressor, Compressor::Deflate);
    }

    #[tokio::test]
    async fn async_build_reports_names_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let plan = BuildPlan::from_request(&request(dir.path(), "nested/out/x.tar")).unwrap();

        let summary = build_archive(plan).await.unwrap();
        assert_eq!(summary.format, ArchiveFormat::Tar);
        assert_eq!(summary.names, [b"../../tmp/evil/a.txt".to_vec(), b"b.txt".to_vec()]);
        assert!(dir.path().join("nested/out/x.tar").is_file());
    }
}

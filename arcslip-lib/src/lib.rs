//! Builds zip/jar/tar archives in which one chosen file is stored under a
//! directory-traversal name such as `../../tmp/evil/payload`, for exercising
//! archive extractors against path traversal ("Zip Slip").

use std::path::PathBuf;

pub mod error;
pub mod format;
pub mod naming;
pub mod packaging;
pub mod validate;

pub use error::{BuildError, ErrorKind, Result};
pub use format::ArchiveFormat;
pub use naming::{TraversalPath, resolve_name};
pub use packaging::{BuildPlan, BuildSummary, Compressor, FileEntry, build_archive, build_archive_sync};
pub use validate::validate_inputs;

/// Inputs for one build, as collected by the CLI.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub files: Vec<PathBuf>,
    pub target: PathBuf,
    pub traversal: String,
    pub output: PathBuf,
    pub compress: bool,
}

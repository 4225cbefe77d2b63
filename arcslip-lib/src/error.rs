use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a build. Every variant is terminal for the run.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("At least one input file is required")]
    NoInputs,

    #[error("File not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Cannot access {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error(
        "The file specified with --target must be in the input file list: {}",
        .0.display()
    )]
    TargetNotInFiles(PathBuf),

    #[error("Unsupported archive extension: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read {}: {source}", path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Zip error: {0}")]
    Zip(#[from] async_zip::error::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Coarse classification used by the CLI to pick an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UnsupportedFormat,
    ArchiveWrite,
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::NoInputs
            | BuildError::MissingInput(_)
            | BuildError::Unreadable { .. }
            | BuildError::NotAFile(_)
            | BuildError::TargetNotInFiles(_) => ErrorKind::Validation,
            BuildError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            BuildError::ArchiveWrite { .. }
            | BuildError::Zip(_)
            | BuildError::Io(_)
            | BuildError::Task(_) => ErrorKind::ArchiveWrite,
        }
    }

    pub(crate) fn read_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        BuildError::ArchiveWrite {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};
use crate::naming::identity;

/// Checks done before any archive I/O: every input is an existing regular
/// file, and `target` is one of them (compared by identity).
pub fn validate_inputs(files: &[PathBuf], target: &Path) -> Result<()> {
    if files.is_empty() {
        return Err(BuildError::NoInputs);
    }

    for file in files {
        match fs::metadata(file) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(BuildError::NotAFile(file.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BuildError::MissingInput(file.clone()));
            }
            Err(source) => {
                return Err(BuildError::Unreadable {
                    path: file.clone(),
                    source,
                });
            }
        }
    }

    let target_id = identity(target);
    if !files.iter().any(|f| identity(f) == target_id) {
        return Err(BuildError::TargetNotInFiles(target.to_path_buf()));
    }

    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::packaging::FileEntry;

/// Prefix applied to the name of the target entry.
///
/// A non-empty prefix always ends with a separator, so `"a/b"` and `"a/b/"`
/// produce the same entry names. Nothing else about the string is touched:
/// `..` segments, doubled slashes and backslashes are kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TraversalPath(String);

impl TraversalPath {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        if !raw.is_empty() && !raw.ends_with(['/', '\\']) {
            raw.push('/');
        }
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn prefix(&self, base_name: &[u8]) -> Vec<u8> {
        let mut name = Vec::with_capacity(self.0.len() + base_name.len());
        name.extend_from_slice(self.0.as_bytes());
        name.extend_from_slice(base_name);
        name
    }
}

/// Final path segment, or the whole path when there is none, as the bytes the
/// OS hands back. Names that aren't valid UTF-8 are kept unchanged.
pub fn base_name(path: &Path) -> Vec<u8> {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .as_encoded_bytes()
        .to_vec()
}

/// Identity of a file for target matching: the canonical absolute path, or the
/// lexical absolute path if the file can't be canonicalized.
pub fn identity(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Name stored in the archive for `file`.
pub fn resolve_name(file: &Path, target: &Path, traversal: &TraversalPath) -> Vec<u8> {
    name_for(file, &identity(target), traversal)
}

fn name_for(file: &Path, target_id: &Path, traversal: &TraversalPath) -> Vec<u8> {
    let name = base_name(file);
    if identity(file) == target_id {
        traversal.prefix(&name)
    } else {
        name
    }
}

/// Pairs every input file with its archive name, keeping input order.
pub fn prepare_entries(
    files: &[PathBuf],
    target: &Path,
    traversal: &TraversalPath,
) -> Vec<FileEntry> {
    let target_id = identity(target);
    files
        .iter()
        .map(|path| FileEntry {
            path: path.clone(),
            name_in_archive: name_for(path, &target_id, traversal),
        })
        .collect()
}

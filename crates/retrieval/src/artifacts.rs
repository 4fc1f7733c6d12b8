use std::path::{Path, PathBuf};

use core_types::has_extension;

use crate::error::{Result, RetrievalError};

/// Model files in `dir`, sorted by file name.
///
/// The position of a file in this listing is the candidate row it stands for.
pub fn list_artifacts<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Result<Vec<PathBuf>> {
    sorted_files(dir, extensions)
}

/// Regular files in `dir` whose extension is one of `extensions`, sorted by name.
pub(crate) fn sorted_files<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RetrievalError::DirectoryNotFound(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir).map_err(|e| RetrievalError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| RetrievalError::io(dir, e))?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

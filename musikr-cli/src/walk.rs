//! Directory-traversal convenience: apply a per-file operation to every
//! regular file reachable from a path, recursing into directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::args::OpError;

/// Collects every regular file at or under `path`. A plain file is returned
/// as a single-element list; a directory is walked recursively.
pub fn collect_files(path: &str) -> Result<Vec<PathBuf>, OpError> {
    let root = Path::new(path);

    if !root.exists() {
        return Err(OpError::NotFound(path.to_string()));
    }

    let mut files = Vec::new();
    walk(root, &mut files)?;
    Ok(files)
}

fn walk(path: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    if path.is_dir() {
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            walk(&entry.path(), files)?;
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    }

    Ok(())
}

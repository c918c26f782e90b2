//! Atomic file rewrite: splice a (possibly larger) tag buffer into a file
//! via a sibling `.mod` file, then rename it into place.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::err::RewriteError;

const SIBLING_SUFFIX: &str = ".mod";

/// Replaces the tag region `[tag_start, tag_start + original_tag_len)` of
/// the file at `path` with `new_tag`, preserving every other byte.
///
/// Steps 1-3 (reading prefix/suffix) are read-only and leave no trace on
/// failure. Steps 4-6 may leave a `<path>.mod` sibling behind on failure,
/// which the caller should treat as recoverable. Step 7 (the rename) is the
/// commit point: once it succeeds the original bytes are gone for good.
pub fn rewrite_tag_region(
    path: &Path,
    tag_start: u64,
    original_tag_len: u64,
    new_tag: &[u8],
) -> Result<(), RewriteError> {
    let mut source = File::open(path).map_err(RewriteError::Io)?;

    let mut prefix = vec![0u8; tag_start as usize];
    source.read_exact(&mut prefix).map_err(RewriteError::Io)?;

    source
        .seek(SeekFrom::Start(tag_start + original_tag_len))
        .map_err(RewriteError::Io)?;
    let mut suffix = Vec::new();
    source.read_to_end(&mut suffix).map_err(RewriteError::Io)?;
    drop(source);

    let sibling_path = sibling_path(path);

    let write_result = write_sibling(&sibling_path, &prefix, new_tag, &suffix);
    if let Err(err) = write_result {
        let _ = fs::remove_file(&sibling_path);
        return Err(RewriteError::Io(err));
    }

    fs::rename(&sibling_path, path).map_err(RewriteError::Rename)
}

fn write_sibling(sibling_path: &Path, prefix: &[u8], tag: &[u8], suffix: &[u8]) -> io::Result<()> {
    let mut sibling = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(sibling_path)?;

    sibling.write_all(prefix)?;
    sibling.write_all(tag)?;
    sibling.write_all(suffix)?;
    sibling.flush()
}

fn sibling_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(SIBLING_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = env::temp_dir();
        path.push(format!("musikr_rewrite_test_{}_{}", std::process::id(), name));
        path
    }

    #[test]
    fn splices_new_tag_and_preserves_surrounding_bytes() {
        let path = temp_path("splice");
        fs::write(&path, b"PREFIX[old-tag]SUFFIX").unwrap();

        rewrite_tag_region(&path, 6, 9, b"[a much bigger tag]").unwrap();

        let result = fs::read(&path).unwrap();
        assert_eq!(result, b"PREFIX[a much bigger tag]SUFFIX");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn shrinking_tag_region_is_also_supported() {
        let path = temp_path("shrink");
        fs::write(&path, b"PRE[big-old-tag-here]POST").unwrap();

        rewrite_tag_region(&path, 3, 18, b"[x]").unwrap();

        let result = fs::read(&path).unwrap();
        assert_eq!(result, b"PRE[x]POST");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn no_sibling_file_remains_after_success() {
        let path = temp_path("cleanup");
        fs::write(&path, b"ABCDEF").unwrap();

        rewrite_tag_region(&path, 0, 3, b"XYZ").unwrap();

        assert!(!sibling_path(&path).exists());
        fs::remove_file(&path).unwrap();
    }
}

//! File primitives used by the engine.
//!
//! ## `atomic_write`
//!
//! 1. Ensure the parent directory exists.
//! 2. Write to `<path>.nrtk.tmp`.
//! 3. Rename to the final path (atomic on POSIX). On failure the `.tmp` is
//!    removed and the original file is left as it was.
//!
//! Every primitive reports failures as [`SyncError::Io`] with the offending
//! path; nothing fails silently.

use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Suffix of in-flight writes. Leftovers are untracked and get cleaned up by
/// the next reconcile.
pub const TMP_SUFFIX: &str = ".nrtk.tmp";

/// Atomically replace `path` with `content`.
pub fn atomic_write(path: &Path, content: &str) -> Result<(), SyncError> {
    let tmp = PathBuf::from(format!("{}{TMP_SUFFIX}", path.display()));
    atomic_write_with_tmp(path, content, &tmp)
}

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    tracing::debug!("wrote: {}", path.display());
    Ok(())
}

/// Move `from` into `dir`, keeping its file name. Returns the new path.
pub fn move_into(from: &Path, dir: &Path) -> Result<PathBuf, SyncError> {
    let name = from
        .file_name()
        .ok_or_else(|| io_err(from, std::io::Error::other("path has no file name")))?;
    let to = dir.join(name);
    std::fs::rename(from, &to).map_err(|e| io_err(from, e))?;
    Ok(to)
}

/// Delete a single file.
pub fn remove(path: &Path) -> Result<(), SyncError> {
    std::fs::remove_file(path).map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! On-disk layout.
//!
//! ```text
//! <base>/
//!   .nrtk/
//!     meta.json            live metadata record
//!     sync.log             optional log sink
//!     bin/<checksum>/      snapshots of superseded content
//!   www/                   content directory: one file per anchor,
//!                          error.html, sitemap.xml
//! ```

use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

pub const APP_DIR: &str = ".nrtk";
pub const CONTENT_DIR: &str = "www";
pub const BIN_DIR: &str = "bin";
pub const META_FILE: &str = "meta.json";
pub const LOG_FILE: &str = "sync.log";

/// Resolved paths for one mirror instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Layout { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn app_dir(&self) -> PathBuf {
        self.base.join(APP_DIR)
    }

    pub fn bin_root(&self) -> PathBuf {
        self.app_dir().join(BIN_DIR)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.app_dir().join(META_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.app_dir().join(LOG_FILE)
    }

    pub fn content_dir(&self) -> PathBuf {
        self.base.join(CONTENT_DIR)
    }

    /// Snapshot directory for the state identified by `checksum`.
    pub fn snapshot_dir(&self, checksum: &str) -> PathBuf {
        self.bin_root().join(checksum)
    }

    /// Create the app, snapshot-root and content directories. Idempotent.
    pub fn ensure_dirs(&self) -> Result<(), SyncError> {
        for dir in [self.app_dir(), self.bin_root(), self.content_dir()] {
            if dir.is_dir() {
                tracing::debug!(path = %dir.display(), "directory exists");
                continue;
            }
            std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
        Ok(())
    }
}

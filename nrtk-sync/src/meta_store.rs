//! Metadata store: the persisted record of the last successfully synced state.
//!
//! Lives at `<base>/.nrtk/meta.json`. Reads never fail: a missing or
//! malformed record means "no previous state". A checksum that is not a
//! SHA-256 hex digest counts as malformed, since it names a directory. Writes use the same atomic
//! `.tmp` + rename pattern as the content writer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use serde_json::Value;

use nrtk_core::is_checksum;
use nrtk_core::types::{Anchor, MetadataRecord, StoryRecord};

use crate::error::{io_err, SyncError};
use crate::paths::{Layout, META_FILE};
use crate::writer::atomic_write;

/// Lenient shape accepted on read. Records written by earlier deployments
/// carry `updated_at` as `"2025-01-02 03:04:05.678901+00:00"`.
#[derive(Debug, Deserialize)]
struct MetadataCompat {
    checksum: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    entity: Value,
    #[serde(default)]
    homepage_url: String,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    stories: BTreeMap<Anchor, StoryRecord>,
}

impl From<MetadataCompat> for MetadataRecord {
    fn from(c: MetadataCompat) -> Self {
        MetadataRecord {
            checksum: c.checksum,
            title: c.title,
            entity: c.entity,
            homepage_url: c.homepage_url,
            updated_at: c
                .updated_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
            stories: c.stories,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| raw.parse::<DateTime<FixedOffset>>())
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Read the live metadata record.
///
/// Returns `None` (with a warning) when the file is missing, unreadable or
/// malformed.
pub fn read(layout: &Layout) -> Option<MetadataRecord> {
    let path = layout.meta_path();
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "metadata file not found");
            return None;
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "unable to read metadata file");
            return None;
        }
    };
    match serde_json::from_str::<MetadataCompat>(&contents) {
        Ok(record) if !is_checksum(&record.checksum) => {
            tracing::warn!(
                path = %path.display(),
                checksum = %record.checksum,
                "metadata checksum is not a sha256 digest, ignored"
            );
            None
        }
        Ok(record) => Some(record.into()),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "malformed metadata file ignored");
            None
        }
    }
}

/// Move the live record into `snapshot_dir`, if there is one.
///
/// Returns the archived path.
pub fn archive(layout: &Layout, snapshot_dir: &Path) -> Result<Option<PathBuf>, SyncError> {
    let path = layout.meta_path();
    if !path.is_file() {
        return Ok(None);
    }
    let target = snapshot_dir.join(META_FILE);
    tracing::warn!(to = %target.display(), "moving old metadata into snapshot");
    std::fs::rename(&path, &target).map_err(|e| io_err(&path, e))?;
    Ok(Some(target))
}

/// Persist `record` as the live metadata, archiving the previous record into
/// `snapshot_dir` first when a snapshot is active.
///
/// Returns `Ok(false)` without touching disk if the record cannot be
/// serialized; the old record then stays live.
pub fn save(
    layout: &Layout,
    record: &MetadataRecord,
    snapshot_dir: Option<&Path>,
) -> Result<bool, SyncError> {
    tracing::info!("updating local metadata");
    let json = match serde_json::to_string_pretty(record) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!(error = %err, record = ?record, "metadata serialization failed");
            return Ok(false);
        }
    };

    if let Some(snapshot) = snapshot_dir {
        archive(layout, snapshot)?;
    }
    atomic_write(&layout.meta_path(), &json)?;
    Ok(true)
}

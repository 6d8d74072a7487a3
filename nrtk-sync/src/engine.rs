//! Synchronization engine.
//!
//! One cycle:
//!
//! ```text
//! FETCH -> VALIDATE -> UNCHANGED
//!                   -> CHANGED -> ARCHIVE -> RECONCILE -> PERSIST_META -> RENDER
//! ```
//!
//! Everything a cycle needs travels in a [`SyncContext`]; nothing is carried
//! over between cycles except what is on disk.
//!
//! ## Reconcile rules
//!
//! For every file in the content directory:
//!
//! | tracked in previous metadata? | in new set? | hash        | action            |
//! |-------------------------------|-------------|-------------|-------------------|
//! | no                            | –           | –           | delete            |
//! | yes                           | no          | –           | move to snapshot  |
//! | yes                           | yes         | differs     | move to snapshot  |
//! | yes                           | yes         | same        | keep              |
//!
//! Afterwards every story of the new set is written, kept ones included: the
//! keep decision only governs archival.

use std::path::{Path, PathBuf};

use chrono::Utc;

use nrtk_core::{validate_response, MetadataRecord, ValidatedDocument};
use nrtk_renderer::Renderer;

use crate::error::{io_err, SyncError};
use crate::fetch::ContentSource;
use crate::meta_store;
use crate::paths::Layout;
use crate::writer::{atomic_write, move_into, remove};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Why a live file was moved into the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveReason {
    /// The story is still served but its hash changed.
    Updated,
    /// The story is no longer served.
    Removed,
}

/// What happened to a single file during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// Untracked file removed without archival.
    Deleted { path: PathBuf },
    /// Tracked file moved into the snapshot directory.
    Archived {
        path: PathBuf,
        to: PathBuf,
        reason: ArchiveReason,
    },
    /// Tracked file whose hash is unchanged; not archived.
    Kept { path: PathBuf },
    /// Story or site file written.
    Written { path: PathBuf },
    /// Entry that is not a regular file; left alone.
    Skipped { path: PathBuf },
}

/// Summary of a cycle that applied a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub previous_checksum: Option<String>,
    pub checksum: String,
    /// Snapshot directory used for archival, if there was a previous state.
    pub snapshot: Option<PathBuf>,
    pub actions: Vec<FileAction>,
    /// `false` if the new metadata could not be serialized.
    pub metadata_saved: bool,
}

impl SyncReport {
    pub fn count(&self, pred: impl Fn(&FileAction) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }

    pub fn archived(&self) -> usize {
        self.count(|a| matches!(a, FileAction::Archived { .. }))
    }

    pub fn deleted(&self) -> usize {
        self.count(|a| matches!(a, FileAction::Deleted { .. }))
    }

    pub fn written(&self) -> usize {
        self.count(|a| matches!(a, FileAction::Written { .. }))
    }
}

/// Result of one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The remote checksum matches the local metadata; nothing was touched.
    Unchanged { checksum: String },
    /// The remote document differed and has been applied.
    Synced(SyncReport),
}

// ---------------------------------------------------------------------------
// Per-cycle context
// ---------------------------------------------------------------------------

/// State threaded through one cycle.
pub struct SyncContext<'a> {
    pub layout: &'a Layout,
    /// Last successfully synced state, if any.
    pub previous: Option<MetadataRecord>,
    pub remote: ValidatedDocument,
    /// Active snapshot directory; set by [`SyncContext::open_snapshot`].
    pub snapshot: Option<PathBuf>,
}

impl<'a> SyncContext<'a> {
    pub fn new(layout: &'a Layout, previous: Option<MetadataRecord>, remote: ValidatedDocument) -> Self {
        SyncContext {
            layout,
            previous,
            remote,
            snapshot: None,
        }
    }

    pub fn previous_checksum(&self) -> Option<&str> {
        self.previous.as_ref().map(|m| m.checksum.as_str())
    }

    /// `true` when the remote document differs from the recorded state.
    pub fn is_changed(&self) -> bool {
        self.previous_checksum() != Some(self.remote.checksum.as_str())
    }

    /// Create the snapshot directory named after the previous checksum.
    /// No-op without a previous state; an existing directory is reused.
    pub fn open_snapshot(&mut self) -> Result<Option<&Path>, SyncError> {
        let Some(previous) = self.previous_checksum() else {
            return Ok(None);
        };
        let dir = self.layout.snapshot_dir(previous);
        tracing::info!(snapshot = %previous, "creating snapshot");
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        self.snapshot = Some(dir);
        Ok(self.snapshot.as_deref())
    }

    /// Decide archive / delete / keep for every entry of the content
    /// directory, then write every story of the new set.
    pub fn reconcile(&self) -> Result<Vec<FileAction>, SyncError> {
        tracing::info!("cleaning local storage");
        let content_dir = self.layout.content_dir();
        let mut entries = std::fs::read_dir(&content_dir)
            .map_err(|e| io_err(&content_dir, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| io_err(&content_dir, e))?;
        entries.sort_by_key(|e| e.file_name());

        let mut actions = Vec::with_capacity(entries.len() + self.remote.document.stories.len());
        for entry in entries {
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
            if file_type.is_dir() {
                tracing::warn!(path = %path.display(), "skipping directory in content dir");
                actions.push(FileAction::Skipped { path });
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            actions.push(self.reconcile_file(&name, path)?);
        }

        for story in &self.remote.document.stories {
            let path = content_dir.join(story.anchor.as_str());
            tracing::info!(anchor = %story.anchor, "saving story");
            atomic_write(&path, &story.content)?;
            actions.push(FileAction::Written { path });
        }
        Ok(actions)
    }

    fn reconcile_file(&self, name: &str, path: PathBuf) -> Result<FileAction, SyncError> {
        let Some((previous, tracked)) = self
            .previous
            .as_ref()
            .and_then(|m| m.tracked(name).map(|t| (m, t)))
        else {
            tracing::warn!(path = %path.display(), "removing untracked file");
            remove(&path)?;
            return Ok(FileAction::Deleted { path });
        };

        let reason = match self.remote.story(name) {
            None => ArchiveReason::Removed,
            Some(story) if story.hash != tracked.hash => ArchiveReason::Updated,
            Some(_) => return Ok(FileAction::Kept { path }),
        };
        // Fails if the snapshot was never opened; tracked files are never dropped.
        let snapshot = self
            .snapshot
            .clone()
            .unwrap_or_else(|| self.layout.snapshot_dir(&previous.checksum));
        let to = move_into(&path, &snapshot)?;
        match reason {
            ArchiveReason::Updated => {
                tracing::warn!(anchor = %name, to = %to.display(), "page updated, old version moved to snapshot")
            }
            ArchiveReason::Removed => {
                tracing::warn!(anchor = %name, to = %to.display(), "page removed, file moved to snapshot")
            }
        }
        Ok(FileAction::Archived { path, to, reason })
    }

    /// Archive the old metadata (when a snapshot is active) and write the
    /// record for the new state. Serialization failures are non-fatal.
    pub fn persist_metadata(&self) -> Result<bool, SyncError> {
        let record = MetadataRecord::build(&self.remote.document, &self.remote.checksum, Utc::now());
        let saved = meta_store::save(self.layout, &record, self.snapshot.as_deref())?;
        if !saved {
            tracing::error!("metadata not updated; next cycle starts from the stale record");
        }
        Ok(saved)
    }

    /// Regenerate `sitemap.xml` and `error.html`.
    pub fn render_site_files(&self, renderer: &Renderer) -> Result<Vec<FileAction>, SyncError> {
        tracing::info!("generating sitemap and error page");
        let outputs = renderer.render(&self.remote.document, &self.layout.content_dir())?;
        let mut actions = Vec::with_capacity(outputs.len());
        for (path, content) in outputs {
            atomic_write(&path, &content)?;
            actions.push(FileAction::Written { path });
        }
        Ok(actions)
    }
}

// ---------------------------------------------------------------------------
// sync_cycle
// ---------------------------------------------------------------------------

/// Run one full cycle against `source`.
///
/// Reads the live metadata, fetches and validates the remote document, and
/// applies it if its checksum differs. Errors abort the cycle; files already
/// moved or written stay as they are.
pub fn sync_cycle(
    layout: &Layout,
    source: &dyn ContentSource,
    renderer: &Renderer,
) -> Result<CycleOutcome, SyncError> {
    tracing::debug!("content sync");
    let previous = meta_store::read(layout);

    let response = source.fetch()?;
    let remote = validate_response(&response)?;

    let mut ctx = SyncContext::new(layout, previous, remote);
    if !ctx.is_changed() {
        tracing::debug!("content is up to date");
        return Ok(CycleOutcome::Unchanged {
            checksum: ctx.remote.checksum,
        });
    }
    tracing::debug!(checksum = %ctx.remote.checksum, "content update detected");

    ctx.open_snapshot()?;
    let mut actions = ctx.reconcile()?;
    let metadata_saved = ctx.persist_metadata()?;
    actions.extend(ctx.render_site_files(renderer)?);

    Ok(CycleOutcome::Synced(SyncReport {
        previous_checksum: ctx.previous_checksum().map(str::to_owned),
        checksum: ctx.remote.checksum.clone(),
        snapshot: ctx.snapshot.clone(),
        actions,
        metadata_saved,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use nrtk_core::{validate_document, RawResponse};
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    fn story(anchor: &str, hash: &str) -> Value {
        json!({
            "canonical_url": format!("https://example.com/{anchor}"),
            "content": format!("{anchor}@{hash}"),
            "anchor": anchor,
            "updated_at": "2025-03-01T10:20:30Z",
            "title": anchor,
            "is_landing": anchor == "index",
            "hash": hash,
            "uid": 1,
            "credits": null,
        })
    }

    fn remote(stories: Vec<Value>) -> ValidatedDocument {
        validate_document(json!({
            "homepage_url": "https://example.com",
            "stories": stories,
            "error_page": "<h1>404</h1>",
            "entity": null,
            "title": "Example",
        }))
        .expect("valid")
    }

    fn make_layout() -> (TempDir, Layout) {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        layout.ensure_dirs().unwrap();
        (tmp, layout)
    }

    fn previous_for(doc: &ValidatedDocument) -> MetadataRecord {
        MetadataRecord::build(&doc.document, &doc.checksum, Utc::now())
    }

    #[test]
    fn unchanged_when_checksums_match() {
        let (_tmp, layout) = make_layout();
        let doc = remote(vec![story("index", "a")]);
        let ctx = SyncContext::new(&layout, Some(previous_for(&doc)), doc.clone());
        assert!(!ctx.is_changed());
    }

    #[test]
    fn changed_without_previous_state() {
        let (_tmp, layout) = make_layout();
        let ctx = SyncContext::new(&layout, None, remote(vec![]));
        assert!(ctx.is_changed());
    }

    #[test]
    fn open_snapshot_without_previous_is_noop() {
        let (_tmp, layout) = make_layout();
        let mut ctx = SyncContext::new(&layout, None, remote(vec![]));
        assert!(ctx.open_snapshot().unwrap().is_none());
        assert_eq!(fs::read_dir(layout.bin_root()).unwrap().count(), 0);
    }

    #[test]
    fn open_snapshot_reuses_existing_directory() {
        let (_tmp, layout) = make_layout();
        let old = remote(vec![story("index", "a")]);
        let dir = layout.snapshot_dir(&old.checksum);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("keep-me"), "x").unwrap();

        let mut ctx = SyncContext::new(&layout, Some(previous_for(&old)), remote(vec![]));
        let opened = ctx.open_snapshot().unwrap().map(Path::to_path_buf);
        assert_eq!(opened, Some(dir.clone()));
        assert!(dir.join("keep-me").exists());
    }

    #[test]
    fn reconcile_applies_every_rule() {
        let (_tmp, layout) = make_layout();
        let www = layout.content_dir();
        let old = remote(vec![story("index", "a"), story("same", "s"), story("gone", "g")]);
        for s in &old.document.stories {
            fs::write(www.join(s.anchor.as_str()), &s.content).unwrap();
        }
        fs::write(www.join("foreign.txt"), "junk").unwrap();
        fs::create_dir_all(www.join("assets")).unwrap();

        let new = remote(vec![story("index", "b"), story("same", "s"), story("fresh", "f")]);
        let mut ctx = SyncContext::new(&layout, Some(previous_for(&old)), new);
        let snapshot = ctx.open_snapshot().unwrap().unwrap().to_path_buf();
        let actions = ctx.reconcile().unwrap();

        assert!(actions.contains(&FileAction::Deleted { path: www.join("foreign.txt") }));
        assert!(actions.contains(&FileAction::Skipped { path: www.join("assets") }));
        assert!(actions.contains(&FileAction::Kept { path: www.join("same") }));
        assert!(actions.contains(&FileAction::Archived {
            path: www.join("index"),
            to: snapshot.join("index"),
            reason: ArchiveReason::Updated,
        }));
        assert!(actions.contains(&FileAction::Archived {
            path: www.join("gone"),
            to: snapshot.join("gone"),
            reason: ArchiveReason::Removed,
        }));

        assert!(!www.join("foreign.txt").exists());
        assert!(!snapshot.join("foreign.txt").exists());
        assert!(!www.join("gone").exists());
        assert_eq!(fs::read_to_string(snapshot.join("gone")).unwrap(), "gone@g");
        assert_eq!(fs::read_to_string(snapshot.join("index")).unwrap(), "index@a");
        assert_eq!(fs::read_to_string(www.join("index")).unwrap(), "index@b");
        assert_eq!(fs::read_to_string(www.join("fresh")).unwrap(), "fresh@f");
        assert!(!snapshot.join("same").exists(), "unchanged story is not archived");
    }

    #[test]
    fn kept_story_is_still_rewritten() {
        let (_tmp, layout) = make_layout();
        let www = layout.content_dir();
        let old = remote(vec![story("same", "s")]);
        fs::write(www.join("same"), "locally edited").unwrap();

        let new = remote(vec![story("same", "s"), story("other", "o")]);
        let mut ctx = SyncContext::new(&layout, Some(previous_for(&old)), new);
        ctx.open_snapshot().unwrap();
        let actions = ctx.reconcile().unwrap();

        assert!(actions.contains(&FileAction::Kept { path: www.join("same") }));
        assert!(actions.contains(&FileAction::Written { path: www.join("same") }));
        assert_eq!(fs::read_to_string(www.join("same")).unwrap(), "same@s");
    }

    #[test]
    fn without_previous_state_everything_is_untracked() {
        let (_tmp, layout) = make_layout();
        let www = layout.content_dir();
        fs::write(www.join("index"), "stale").unwrap();

        let ctx = SyncContext::new(&layout, None, remote(vec![story("index", "a")]));
        let actions = ctx.reconcile().unwrap();
        assert_eq!(actions[0], FileAction::Deleted { path: www.join("index") });
        assert_eq!(fs::read_to_string(www.join("index")).unwrap(), "index@a");
    }

    #[test]
    fn persist_metadata_rebuilds_story_map() {
        let (_tmp, layout) = make_layout();
        let old = remote(vec![story("index", "a"), story("gone", "g")]);
        meta_store::save(&layout, &previous_for(&old), None).unwrap();

        let new = remote(vec![story("index", "b")]);
        let mut ctx = SyncContext::new(&layout, meta_store::read(&layout), new.clone());
        let snapshot = ctx.open_snapshot().unwrap().unwrap().to_path_buf();
        assert!(ctx.persist_metadata().unwrap());

        let live = meta_store::read(&layout).unwrap();
        assert_eq!(live.checksum, new.checksum);
        assert_eq!(live.stories.len(), 1);
        assert_eq!(live.tracked("index").unwrap().hash, "b");
        assert!(snapshot.join("meta.json").exists());
    }

    #[test]
    fn render_site_files_writes_sitemap_and_error_page() {
        let (_tmp, layout) = make_layout();
        let ctx = SyncContext::new(&layout, None, remote(vec![story("index", "a")]));
        let actions = ctx.render_site_files(&Renderer::new().unwrap()).unwrap();
        assert_eq!(actions.len(), 2);
        let www = layout.content_dir();
        assert_eq!(fs::read_to_string(www.join("error.html")).unwrap(), "<h1>404</h1>");
        assert!(fs::read_to_string(www.join("sitemap.xml"))
            .unwrap()
            .contains("<priority>1.0</priority>"));
    }

    #[test]
    fn sync_cycle_reports_fetch_failures() {
        let (_tmp, layout) = make_layout();
        let source = || -> Result<RawResponse, FetchError> {
            Err(FetchError::Transport {
                url: "http://x".into(),
                message: "timed out".into(),
            })
        };
        let err = sync_cycle(&layout, &source, &Renderer::new().unwrap()).unwrap_err();
        assert!(matches!(err, SyncError::Fetch(_)));
    }
}

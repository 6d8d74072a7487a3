//! Domain types for the content mirror.
//!
//! Two families live here:
//! - the remote side ([`RemoteDocument`], [`Story`]) as served by the content API;
//! - the local side ([`MetadataRecord`], [`StoryRecord`]) describing the last
//!   successfully synced state.
//!
//! Only fields the mirror interprets are typed: `anchor` and `content` are
//! strings, `updated_at` is sliced for the sitemap and `is_landing` is a bool.
//! Everything else (`entity`, story `title`, `hash`, `canonical_url`, `uid`,
//! `credits`) is carried as an opaque [`serde_json::Value`] and accepted in
//! whatever shape the API sends.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Anchor of the landing page story.
pub const LANDING_ANCHOR: &str = "index";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable story identifier. Doubles as the story's file name in the content
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Anchor(pub String);

impl Anchor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the landing page anchor (`index`).
    pub fn is_landing(&self) -> bool {
        self.0 == LANDING_ANCHOR
    }

    /// `true` if the anchor can be used verbatim as a single file name.
    pub fn is_safe_file_name(&self) -> bool {
        let name = self.0.as_str();
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0'])
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Anchor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Anchor {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Remote document
// ---------------------------------------------------------------------------

/// A single content item served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub canonical_url: Value,
    /// Full page body, written verbatim to `www/<anchor>`.
    pub content: String,
    pub anchor: Anchor,
    /// ISO-8601-like timestamp string, kept as received.
    pub updated_at: String,
    pub title: Value,
    pub is_landing: bool,
    /// Content fingerprint computed by the remote side. Compared by value.
    pub hash: Value,
    pub uid: Value,
    pub credits: Value,
}

impl Story {
    /// `canonical_url` as text for the sitemap.
    pub fn loc(&self) -> String {
        value_text(&self.canonical_url)
    }
}

/// Strings verbatim, `null` as empty, anything else as its JSON text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The full remote document fetched once per sync cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub homepage_url: String,
    pub stories: Vec<Story>,
    pub error_page: String,
    pub entity: Value,
    pub title: String,
}

// ---------------------------------------------------------------------------
// Local metadata
// ---------------------------------------------------------------------------

/// Per-story entry of the metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub anchor: Anchor,
    pub hash: Value,
    pub canonical_url: Value,
    pub updated_at: String,
}

impl From<&Story> for StoryRecord {
    fn from(story: &Story) -> Self {
        StoryRecord {
            anchor: story.anchor.clone(),
            hash: story.hash.clone(),
            canonical_url: story.canonical_url.clone(),
            updated_at: story.updated_at.clone(),
        }
    }
}

/// Persisted description of the last successfully synced state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Checksum of the remote document this record was built from.
    pub checksum: String,
    pub title: String,
    pub entity: Value,
    pub homepage_url: String,
    /// When this record was built.
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub stories: BTreeMap<Anchor, StoryRecord>,
}

impl MetadataRecord {
    /// Build a fresh record for `document`, rebuilding the story map from
    /// scratch. Entries of stories absent from `document` are not carried over.
    pub fn build(document: &RemoteDocument, checksum: &str, now: DateTime<Utc>) -> Self {
        let stories = document
            .stories
            .iter()
            .map(|s| (s.anchor.clone(), StoryRecord::from(s)))
            .collect();
        MetadataRecord {
            checksum: checksum.to_owned(),
            title: document.title.clone(),
            entity: document.entity.clone(),
            homepage_url: document.homepage_url.clone(),
            updated_at: now,
            stories,
        }
    }

    /// Look up the tracked entry for a content-directory file name.
    pub fn tracked(&self, file_name: &str) -> Option<&StoryRecord> {
        self.stories.get(&Anchor::from(file_name))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

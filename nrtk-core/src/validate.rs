//! Response validation.
//!
//! Turns a raw API response into a [`ValidatedDocument`]: typed document,
//! anchor index and whole-document checksum. Validation is fail-fast: the
//! first missing field (top-level or in any story) rejects the payload.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::checksum::{document_checksum, excerpt};
use crate::error::ValidationError;
use crate::types::{Anchor, RemoteDocument, Story};

/// Top-level fields every document must carry.
pub const DOCUMENT_FIELDS: &[&str] = &["homepage_url", "stories", "error_page", "entity", "title"];

/// Fields every story must carry.
pub const STORY_FIELDS: &[&str] = &[
    "canonical_url",
    "content",
    "anchor",
    "updated_at",
    "title",
    "is_landing",
    "hash",
    "uid",
    "credits",
];

/// Maximum length of payload excerpts embedded in errors.
pub const EXCERPT_CHARS: usize = 128;

/// What the transport handed back: status code and undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        RawResponse {
            status: 200,
            body: body.into(),
        }
    }
}

/// A payload that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub document: RemoteDocument,
    /// Anchor → story. On duplicate anchors the later story wins.
    pub stories: BTreeMap<Anchor, Story>,
    /// SHA-256 over the sorted-key rendering of the whole document.
    pub checksum: String,
}

impl ValidatedDocument {
    pub fn story(&self, anchor: &str) -> Option<&Story> {
        self.stories.get(&Anchor::from(anchor))
    }
}

/// Validate a raw response: status first, then JSON, then schema.
pub fn validate_response(response: &RawResponse) -> Result<ValidatedDocument, ValidationError> {
    if response.status != 200 {
        return Err(ValidationError::Http {
            status: response.status,
        });
    }
    let value: Value =
        serde_json::from_str(&response.body).map_err(|source| ValidationError::Format {
            excerpt: response.body.chars().take(EXCERPT_CHARS).collect(),
            source,
        })?;
    validate_document(value)
}

/// Validate an already parsed document.
pub fn validate_document(value: Value) -> Result<ValidatedDocument, ValidationError> {
    let checksum = document_checksum(&value);
    let doc_excerpt = excerpt(&value, EXCERPT_CHARS);

    let Value::Object(mut root) = value else {
        return Err(ValidationError::Schema {
            reason: "invalid response: top-level object expected".to_string(),
            excerpt: doc_excerpt,
        });
    };

    if let Some(field) = first_missing(&root, DOCUMENT_FIELDS) {
        return Err(ValidationError::Schema {
            reason: format!("invalid response: unable to find `{field}`"),
            excerpt: doc_excerpt,
        });
    }

    let raw_stories = match root.remove("stories") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(ValidationError::Schema {
                reason: "invalid response: `stories` must be a list".to_string(),
                excerpt: doc_excerpt,
            })
        }
    };

    if raw_stories.is_empty() {
        tracing::warn!("no stories received; instance content will be cleared");
    }

    let mut stories = Vec::with_capacity(raw_stories.len());
    let mut index = BTreeMap::new();
    for raw in raw_stories {
        let story = validate_story(raw)?;
        if let Some(previous) = index.insert(story.anchor.clone(), story.clone()) {
            tracing::warn!(
                anchor = %previous.anchor,
                "duplicate anchor in response; the later story replaces the earlier one"
            );
        }
        stories.push(story);
    }

    let document = RemoteDocument {
        homepage_url: take_field(&mut root, "homepage_url", &doc_excerpt)?,
        stories,
        error_page: take_field(&mut root, "error_page", &doc_excerpt)?,
        entity: root.remove("entity").unwrap_or(Value::Null),
        title: take_field(&mut root, "title", &doc_excerpt)?,
    };

    tracing::debug!(checksum = %checksum, stories = index.len(), "valid API response");
    Ok(ValidatedDocument {
        document,
        stories: index,
        checksum,
    })
}

fn validate_story(raw: Value) -> Result<Story, ValidationError> {
    let story_excerpt = excerpt(&raw, EXCERPT_CHARS);
    let Value::Object(map) = &raw else {
        return Err(ValidationError::Schema {
            reason: "invalid story: object expected".to_string(),
            excerpt: story_excerpt,
        });
    };
    if let Some(field) = first_missing(map, STORY_FIELDS) {
        return Err(ValidationError::Schema {
            reason: format!("invalid story: unable to find `{field}`"),
            excerpt: story_excerpt,
        });
    }

    let story: Story = serde_json::from_value(raw).map_err(|e| ValidationError::Schema {
        reason: format!("invalid story: {e}"),
        excerpt: story_excerpt.clone(),
    })?;

    if !story.anchor.is_safe_file_name() {
        return Err(ValidationError::Schema {
            reason: format!("invalid story: anchor `{}` is not a plain file name", story.anchor),
            excerpt: story_excerpt,
        });
    }
    Ok(story)
}

fn first_missing(map: &Map<String, Value>, fields: &[&'static str]) -> Option<&'static str> {
    fields.iter().copied().find(|f| !map.contains_key(*f))
}

fn take_field<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    field: &str,
    doc_excerpt: &str,
) -> Result<T, ValidationError> {
    let value = root.remove(field).unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| ValidationError::Schema {
        reason: format!("invalid response: `{field}`: {e}"),
        excerpt: doc_excerpt.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

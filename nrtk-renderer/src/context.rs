//! Template context: serializable sitemap payload built from a [`RemoteDocument`].

use serde::{Deserialize, Serialize};

use nrtk_core::types::{RemoteDocument, Story};

use crate::error::RenderError;

/// Priority of the landing page entry.
pub const LANDING_PRIORITY: &str = "1.0";
/// Priority of every other entry.
pub const STORY_PRIORITY: &str = "0.8";

/// Offset appended to the truncated `updated_at` value. Remote timestamps are UTC.
const LASTMOD_OFFSET: &str = "+00:00";
/// `YYYY-MM-DDTHH:MM:SS`
const LASTMOD_PREFIX_CHARS: usize = 19;

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapItem {
    pub loc: String,
    pub lastmod: String,
    pub priority: String,
}

impl From<&Story> for SitemapItem {
    fn from(story: &Story) -> Self {
        let priority = if story.anchor.is_landing() {
            LANDING_PRIORITY
        } else {
            STORY_PRIORITY
        };
        SitemapItem {
            loc: story.loc(),
            lastmod: lastmod(&story.updated_at),
            priority: priority.to_string(),
        }
    }
}

/// Rendering payload for `sitemap.xml`: one item per story, in response order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapContext {
    pub items: Vec<SitemapItem>,
}

impl SitemapContext {
    pub fn from_document(document: &RemoteDocument) -> Self {
        SitemapContext {
            items: document.stories.iter().map(SitemapItem::from).collect(),
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// First 19 characters of `updated_at` with a fixed UTC offset.
pub fn lastmod(updated_at: &str) -> String {
    let mut out: String = updated_at.chars().take(LASTMOD_PREFIX_CHARS).collect();
    out.push_str(LASTMOD_OFFSET);
    out
}

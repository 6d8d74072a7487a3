//! Tera rendering engine: [`SiteFile`] enum and [`Renderer`].
//!
//! | File          | Source                                         |
//! |---------------|------------------------------------------------|
//! | `sitemap.xml` | `sitemap.xml.tera` over [`SitemapContext`]     |
//! | `error.html`  | the document's `error_page`, written verbatim  |

use std::path::{Path, PathBuf};

use tera::Tera;

use nrtk_core::types::RemoteDocument;

use crate::context::SitemapContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const SITEMAP_TEMPLATE: &str = "sitemap.xml.tera";

const TPLS: &[(&str, &str)] = &[(SITEMAP_TEMPLATE, include_str!("templates/sitemap.xml.tera"))];

fn build_tera() -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TPLS.iter().copied())?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// SiteFile
// ---------------------------------------------------------------------------

/// Auxiliary files regenerated in the content directory on every content change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteFile {
    Sitemap,
    ErrorPage,
}

impl SiteFile {
    /// All site files in a stable order.
    pub fn all() -> &'static [SiteFile] {
        &[SiteFile::Sitemap, SiteFile::ErrorPage]
    }

    /// Reserved file name inside the content directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            SiteFile::Sitemap => "sitemap.xml",
            SiteFile::ErrorPage => "error.html",
        }
    }

    pub fn output_path(&self, content_dir: &Path) -> PathBuf {
        content_dir.join(self.file_name())
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders the auxiliary site files. Create once with [`Renderer::new`] and reuse.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { tera: build_tera()? })
    }

    /// Render a single site file for `document`.
    pub fn render_file(&self, document: &RemoteDocument, file: SiteFile) -> Result<String, RenderError> {
        match file {
            SiteFile::Sitemap => {
                let ctx = SitemapContext::from_document(document).to_tera_context()?;
                Ok(self.tera.render(SITEMAP_TEMPLATE, &ctx)?)
            }
            SiteFile::ErrorPage => Ok(document.error_page.clone()),
        }
    }

    /// Render every site file.
    ///
    /// Returns `Vec<(output_path, rendered_content)>`, one entry per [`SiteFile`].
    pub fn render(
        &self,
        document: &RemoteDocument,
        content_dir: &Path,
    ) -> Result<Vec<(PathBuf, String)>, RenderError> {
        let mut results = Vec::with_capacity(SiteFile::all().len());
        for file in SiteFile::all() {
            let content = self.render_file(document, *file)?;
            results.push((file.output_path(content_dir), content));
        }
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

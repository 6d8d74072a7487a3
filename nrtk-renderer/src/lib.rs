//! # nrtk-renderer
//!
//! Tera-based rendering of the auxiliary site files (`sitemap.xml`,
//! `error.html`) from a validated remote document. Pure output generation:
//! the caller decides where and when to write.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use nrtk_renderer::Renderer;
//! use nrtk_core::types::RemoteDocument;
//!
//! fn render_all(document: &RemoteDocument) {
//!     if let Ok(renderer) = Renderer::new() {
//!         if let Ok(outputs) = renderer.render(document, Path::new("www")) {
//!             for (path, content) in outputs {
//!                 println!("{}: {} bytes", path.display(), content.len());
//!             }
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{SitemapContext, SitemapItem};
pub use engine::{Renderer, SiteFile};
pub use error::RenderError;

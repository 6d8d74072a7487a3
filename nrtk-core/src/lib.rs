//! nrtk core library: content domain types, response validation, checksums.
//!
//! - [`types`]: remote document, stories, local metadata record
//! - [`validate`]: [`validate_response`] / [`validate_document`]
//! - [`checksum`]: canonical sorted-key JSON and SHA-256 digest
//! - [`error`]: [`ValidationError`]

pub mod checksum;
pub mod error;
pub mod types;
pub mod validate;

pub use checksum::{document_checksum, is_checksum};
pub use error::ValidationError;
pub use types::{Anchor, MetadataRecord, RemoteDocument, Story, StoryRecord, LANDING_ANCHOR};
pub use validate::{validate_document, validate_response, RawResponse, ValidatedDocument};

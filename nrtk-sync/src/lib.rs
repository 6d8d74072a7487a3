//! # nrtk-sync
//!
//! Keeps a local `www/` directory in step with the remote content API.
//!
//! Call [`sync_cycle`] for a single fetch/validate/apply pass, or
//! [`pipeline::run`] to drive cycles on a [`pipeline::Schedule`].

pub mod engine;
pub mod error;
pub mod fetch;
pub mod meta_store;
pub mod paths;
pub mod pipeline;
pub mod writer;

pub use engine::{sync_cycle, ArchiveReason, CycleOutcome, FileAction, SyncContext, SyncReport};
pub use error::{FetchError, SyncError};
pub use fetch::{ContentSource, HttpSource};
pub use paths::Layout;
pub use pipeline::Schedule;

//! Media documents: the data model, the upsert-merge engine, and storage.
//!
//! Movies and TV shows live in separate collections keyed by
//! [`MediaIdentity`]. New download links arrive through the [`Registrar`],
//! which merges each stream variant into the stored document.

mod merge;
mod registrar;
mod sqlite;
mod store;
mod types;

pub use merge::{merge_variant, DedupKey, MergeChange, Merged};
pub use registrar::{Registrar, Registration};
pub use sqlite::{SqliteMediaStore, MAX_PAGE_SIZE};
pub use store::MediaStore;
pub use types::*;

//! Media document storage trait.

use super::{DocumentPatch, MediaDocument, MediaError, MediaIdentity, MediaListQuery, MediaPage, MediaStats};

/// Trait for media document storage backends.
///
/// One logical collection per media type; documents are keyed by
/// [`MediaIdentity`].
pub trait MediaStore: Send + Sync {
    /// Point lookup by identity.
    fn find(&self, identity: &MediaIdentity) -> Result<Option<MediaDocument>, MediaError>;

    /// Create or replace the merge-managed part of a document.
    ///
    /// `expected_version` is the version the document was read at:
    /// - `None`: the document must not exist yet and is inserted whole.
    /// - `Some(v)`: streams/seasons and `updated_at` are replaced only if the
    ///   stored version is still `v`.
    ///
    /// Either way a lost race yields [`MediaError::ConcurrentUpdateConflict`].
    /// Returns the new stored version.
    fn upsert_write(
        &self,
        document: &MediaDocument,
        expected_version: Option<i64>,
    ) -> Result<i64, MediaError>;

    /// List one media type, most recently updated first.
    fn list(&self, query: &MediaListQuery) -> Result<MediaPage, MediaError>;

    /// Apply a descriptive-field patch. Returns whether a document was modified.
    fn update_fields(
        &self,
        identity: &MediaIdentity,
        patch: &DocumentPatch,
    ) -> Result<bool, MediaError>;

    /// Delete a document. Returns whether one existed.
    fn delete(&self, identity: &MediaIdentity) -> Result<bool, MediaError>;

    /// Document counts per media type.
    fn stats(&self) -> Result<MediaStats, MediaError>;
}

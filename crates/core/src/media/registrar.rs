//! Read-merge-write of a single stream variant.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::{
    merge_variant, DedupKey, MediaError, MediaIdentity, MediaStore, MergeChange, ResolvedMedia,
    StreamVariant,
};

/// Outcome of one successful registration.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub identity: MediaIdentity,
    /// Title as stored (an existing document keeps its original title).
    pub title: String,
    pub change: MergeChange,
    /// Length of the stream list the variant landed in.
    pub stream_count: usize,
    /// Stored version after the write.
    pub version: i64,
}

/// Attaches resolved links to stored documents.
pub struct Registrar {
    store: Arc<dyn MediaStore>,
    dedup: DedupKey,
}

impl Registrar {
    pub fn new(store: Arc<dyn MediaStore>, dedup: DedupKey) -> Self {
        Self { store, dedup }
    }

    pub fn dedup_key(&self) -> DedupKey {
        self.dedup
    }

    /// Merge one variant into the document for `resolved.identity`.
    ///
    /// The write is conditional on the version that was read. Losing a race
    /// returns [`MediaError::ConcurrentUpdateConflict`] with nothing written;
    /// retrying is up to the caller.
    pub fn register(
        &self,
        resolved: &ResolvedMedia,
        size: &str,
        display_name: &str,
    ) -> Result<Registration, MediaError> {
        let variant = StreamVariant {
            quality: resolved.quality.clone(),
            url: resolved.url.clone(),
            display_name: display_name.to_string(),
            size: size.to_string(),
        };

        let existing = self.store.find(&resolved.identity)?;
        let expected_version = existing.as_ref().map(|doc| doc.version);
        debug!(
            "Registering {} variant for {} (stored version {:?})",
            resolved.quality, resolved.identity, expected_version
        );

        let merged = merge_variant(existing, resolved, variant, self.dedup, Utc::now())?;
        let version = self.store.upsert_write(&merged.document, expected_version)?;

        let stream_count = match &resolved.episode {
            Some(target) => merged
                .document
                .episode(target.season_number, target.episode_number)
                .map(|e| e.streams.len()),
            None => merged.document.streams().map(|s| s.len()),
        }
        .unwrap_or(0);

        info!(
            "{} '{}' ({}): {:?} [{}], {} stream(s)",
            resolved.identity.media_type,
            merged.document.title,
            resolved.identity.external_id,
            merged.change,
            resolved.quality,
            stream_count
        );

        Ok(Registration {
            identity: resolved.identity,
            title: merged.document.title,
            change: merged.change,
            stream_count,
            version,
        })
    }
}

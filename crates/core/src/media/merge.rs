//! Upsert-merge of one stream variant into a media document.
//!
//! Everything here is pure: the caller hands in the current document (if
//! any) by value and gets the merged document back. Reading and writing
//! the store happens in [`crate::media::Registrar`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Episode, EpisodeTarget, MediaBody, MediaDocument, MediaError, ResolvedMedia, Season,
    StreamVariant,
};

/// Which field makes two variants in the same list "the same stream".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    /// Distinct files are distinct streams, even at equal quality.
    #[default]
    Url,
    /// At most one stream per quality label; a new file replaces the old one.
    Quality,
}

impl DedupKey {
    fn matches(&self, existing: &StreamVariant, incoming: &StreamVariant) -> bool {
        match self {
            DedupKey::Url => existing.url == incoming.url,
            DedupKey::Quality => existing.quality == incoming.quality,
        }
    }
}

/// What a merge did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeChange {
    /// No document existed for the identity.
    Created,
    /// A new stream was appended to an existing list.
    StreamAppended,
    /// A stream matching the dedup key was refreshed in place.
    StreamRefreshed,
    /// A new episode was appended to an existing season.
    EpisodeAdded,
    /// A new season was appended to the show.
    SeasonAdded,
}

impl MergeChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeChange::Created => "created",
            MergeChange::StreamAppended => "stream_appended",
            MergeChange::StreamRefreshed => "stream_refreshed",
            MergeChange::EpisodeAdded => "episode_added",
            MergeChange::SeasonAdded => "season_added",
        }
    }
}

/// Result of merging one variant.
#[derive(Debug, Clone)]
pub struct Merged {
    pub document: MediaDocument,
    pub change: MergeChange,
}

/// Merge `variant` into `existing` (or a fresh document built from
/// `resolved` when there is none).
///
/// Descriptive fields of an existing document are kept as stored; only the
/// nested streams/seasons and `updated_at` change.
pub fn merge_variant(
    existing: Option<MediaDocument>,
    resolved: &ResolvedMedia,
    variant: StreamVariant,
    dedup: DedupKey,
    now: DateTime<Utc>,
) -> Result<Merged, MediaError> {
    resolved.validate()?;

    let Some(mut document) = existing else {
        return Ok(Merged {
            document: new_document(resolved, variant, now),
            change: MergeChange::Created,
        });
    };

    if document.identity != resolved.identity {
        return Err(MediaError::InvalidInput(format!(
            "cannot merge {} into document {}",
            resolved.identity, document.identity
        )));
    }

    let change = match (&mut document.body, &resolved.episode) {
        (MediaBody::Movie { streams }, None) => merge_stream(streams, variant, dedup),
        (MediaBody::TvShow { seasons }, Some(target)) => {
            merge_episode(seasons, target, variant, dedup)
        }
        _ => {
            return Err(MediaError::InvalidInput(format!(
                "stored document {} does not match the resolved media shape",
                document.identity
            )))
        }
    };

    document.updated_at = now;
    Ok(Merged { document, change })
}

/// Refresh the entry matching `dedup`, or append.
fn merge_stream(
    streams: &mut Vec<StreamVariant>,
    variant: StreamVariant,
    dedup: DedupKey,
) -> MergeChange {
    match streams.iter_mut().find(|s| dedup.matches(s, &variant)) {
        Some(slot) => {
            *slot = variant;
            MergeChange::StreamRefreshed
        }
        None => {
            streams.push(variant);
            MergeChange::StreamAppended
        }
    }
}

fn merge_episode(
    seasons: &mut Vec<Season>,
    target: &EpisodeTarget,
    variant: StreamVariant,
    dedup: DedupKey,
) -> MergeChange {
    let Some(season) = seasons
        .iter_mut()
        .find(|s| s.season_number == target.season_number)
    else {
        seasons.push(new_season(target, variant));
        return MergeChange::SeasonAdded;
    };

    match season
        .episodes
        .iter_mut()
        .find(|e| e.episode_number == target.episode_number)
    {
        Some(episode) => merge_stream(&mut episode.streams, variant, dedup),
        None => {
            season.episodes.push(new_episode(target, variant));
            MergeChange::EpisodeAdded
        }
    }
}

// New seasons and episodes come only from the current target and variant,
// never from sibling entries of the stored document.
fn new_episode(target: &EpisodeTarget, variant: StreamVariant) -> Episode {
    Episode {
        episode_number: target.episode_number,
        title: target.title.clone(),
        backdrop_url: target.backdrop_url.clone(),
        streams: vec![variant],
    }
}

fn new_season(target: &EpisodeTarget, variant: StreamVariant) -> Season {
    Season {
        season_number: target.season_number,
        episodes: vec![new_episode(target, variant)],
    }
}

fn new_document(
    resolved: &ResolvedMedia,
    variant: StreamVariant,
    now: DateTime<Utc>,
) -> MediaDocument {
    let body = match &resolved.episode {
        Some(target) => MediaBody::TvShow {
            seasons: vec![new_season(target, variant)],
        },
        None => MediaBody::Movie {
            streams: vec![variant],
        },
    };

    MediaDocument {
        identity: resolved.identity,
        title: resolved.title.clone(),
        genres: resolved.genres.iter().cloned().collect::<BTreeSet<_>>(),
        description: resolved.description.clone(),
        rating: resolved.rating,
        release_year: resolved.release_year,
        poster: resolved.poster.clone(),
        backdrop: resolved.backdrop.clone(),
        logo: resolved.logo.clone(),
        updated_at: now,
        version: 0,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaIdentity;
    use crate::testing::fixtures;
    use chrono::Duration;

    fn variant(quality: &str, url: &str) -> StreamVariant {
        StreamVariant {
            quality: quality.to_string(),
            url: url.to_string(),
            display_name: format!("{}.mkv", quality),
            size: "1.00 GB".to_string(),
        }
    }

    fn merge(
        existing: Option<MediaDocument>,
        resolved: &ResolvedMedia,
        v: StreamVariant,
    ) -> Merged {
        merge_variant(existing, resolved, v, DedupKey::Url, Utc::now()).unwrap()
    }

    #[test]
    fn test_first_movie_variant_creates_document() {
        let resolved = fixtures::resolved_movie(42, "The Answer", "1080p", "u1");
        let merged = merge(None, &resolved, variant("1080p", "u1"));

        assert_eq!(merged.change, MergeChange::Created);
        assert_eq!(merged.document.identity, MediaIdentity::movie(42));
        assert_eq!(merged.document.version, 0);
        assert_eq!(merged.document.streams().unwrap().len(), 1);
        assert!(merged.document.genres.contains("Drama"));
    }

    #[test]
    fn test_same_url_refreshes_in_place() {
        let resolved = fixtures::resolved_movie(42, "The Answer", "1080p", "u1");
        let first = merge(None, &resolved, variant("1080p", "u1")).document;

        let mut refreshed = variant("1080p", "u1");
        refreshed.size = "2.00 GB".to_string();
        let merged = merge(Some(first), &resolved, refreshed);

        assert_eq!(merged.change, MergeChange::StreamRefreshed);
        let streams = merged.document.streams().unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].size, "2.00 GB");
    }

    #[test]
    fn test_url_key_appends_second_file_at_same_quality() {
        let resolved = fixtures::resolved_movie(42, "The Answer", "1080p", "u1");
        let first = merge(None, &resolved, variant("1080p", "u1")).document;
        let merged = merge(Some(first), &resolved, variant("1080p", "u2"));

        assert_eq!(merged.change, MergeChange::StreamAppended);
        assert_eq!(merged.document.streams().unwrap().len(), 2);
    }

    #[test]
    fn test_quality_key_replaces_same_quality() {
        let resolved = fixtures::resolved_movie(42, "The Answer", "1080p", "u1");
        let first = merge(None, &resolved, variant("1080p", "u1")).document;
        let merged = merge_variant(
            Some(first),
            &resolved,
            variant("1080p", "u2"),
            DedupKey::Quality,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(merged.change, MergeChange::StreamRefreshed);
        let streams = merged.document.streams().unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].url, "u2");
    }

    #[test]
    fn test_append_leaves_other_entries_untouched() {
        let resolved = fixtures::resolved_movie(42, "The Answer", "1080p", "u1");
        let first = merge(None, &resolved, variant("1080p", "u1")).document;
        let original = first.streams().unwrap()[0].clone();

        let merged = merge(Some(first), &resolved, variant("720p", "u2"));
        let streams = merged.document.streams().unwrap();
        assert_eq!(streams[0], original);
        assert_eq!(streams[1].quality, "720p");
    }

    #[test]
    fn test_existing_descriptive_fields_are_kept() {
        let resolved = fixtures::resolved_movie(42, "The Answer", "1080p", "u1");
        let mut first = merge(None, &resolved, variant("1080p", "u1")).document;
        first.title = "Edited Title".to_string();

        let mut renamed = resolved.clone();
        renamed.title = "Fresh Upstream Title".to_string();
        let merged = merge(Some(first), &renamed, variant("720p", "u2"));

        assert_eq!(merged.document.title, "Edited Title");
    }

    #[test]
    fn test_merge_refreshes_updated_at() {
        let resolved = fixtures::resolved_movie(42, "The Answer", "1080p", "u1");
        let earlier = Utc::now() - Duration::hours(3);
        let first = merge_variant(
            None,
            &resolved,
            variant("1080p", "u1"),
            DedupKey::Url,
            earlier,
        )
        .unwrap()
        .document;

        let now = Utc::now();
        let merged =
            merge_variant(Some(first), &resolved, variant("720p", "u2"), DedupKey::Url, now)
                .unwrap();
        assert_eq!(merged.document.updated_at, now);
    }

    #[test]
    fn test_new_show_has_single_nested_stream() {
        let resolved = fixtures::resolved_episode(7, "Show", 1, 1, "1080p", "e1");
        let merged = merge(None, &resolved, variant("1080p", "e1"));

        assert_eq!(merged.change, MergeChange::Created);
        let seasons = merged.document.seasons().unwrap();
        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].episodes.len(), 1);
        assert_eq!(seasons[0].episodes[0].streams.len(), 1);
    }

    #[test]
    fn test_new_episode_built_from_current_target() {
        let e1 = fixtures::resolved_episode(7, "Show", 1, 1, "1080p", "e1");
        let doc = merge(None, &e1, variant("1080p", "e1")).document;

        let e2 = fixtures::resolved_episode(7, "Show", 1, 2, "1080p", "e2");
        let merged = merge(Some(doc), &e2, variant("1080p", "e2"));

        assert_eq!(merged.change, MergeChange::EpisodeAdded);
        let season = &merged.document.seasons().unwrap()[0];
        assert_eq!(season.episodes.len(), 2);
        let added = &season.episodes[1];
        assert_eq!(added.episode_number, 2);
        assert_eq!(added.title, "Episode 2");
        assert_eq!(added.streams[0].url, "e2");
        // sibling untouched
        assert_eq!(season.episodes[0].streams[0].url, "e1");
    }

    #[test]
    fn test_new_season_appended() {
        let e1 = fixtures::resolved_episode(7, "Show", 1, 1, "1080p", "e1");
        let doc = merge(None, &e1, variant("1080p", "e1")).document;

        let s2 = fixtures::resolved_episode(7, "Show", 2, 5, "720p", "s2e5");
        let merged = merge(Some(doc), &s2, variant("720p", "s2e5"));

        assert_eq!(merged.change, MergeChange::SeasonAdded);
        let seasons = merged.document.seasons().unwrap();
        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[1].season_number, 2);
        assert_eq!(seasons[1].episodes.len(), 1);
        assert_eq!(seasons[1].episodes[0].episode_number, 5);
    }

    #[test]
    fn test_existing_episode_dedups_streams() {
        let e1 = fixtures::resolved_episode(7, "Show", 1, 1, "1080p", "e1");
        let doc = merge(None, &e1, variant("1080p", "e1")).document;
        let merged = merge(Some(doc), &e1, variant("1080p", "e1"));

        assert_eq!(merged.change, MergeChange::StreamRefreshed);
        let episode = merged.document.episode(1, 1).unwrap();
        assert_eq!(episode.streams.len(), 1);
    }

    #[test]
    fn test_identity_mismatch_rejected() {
        let resolved = fixtures::resolved_movie(42, "The Answer", "1080p", "u1");
        let doc = merge(None, &resolved, variant("1080p", "u1")).document;
        let other = fixtures::resolved_movie(43, "Other", "1080p", "u9");

        let result = merge_variant(
            Some(doc),
            &other,
            variant("1080p", "u9"),
            DedupKey::Url,
            Utc::now(),
        );
        assert!(matches!(result, Err(MediaError::InvalidInput(_))));
    }

    #[test]
    fn test_dedup_key_serialization() {
        assert_eq!(serde_json::to_string(&DedupKey::Url).unwrap(), "\"url\"");
        assert_eq!(
            serde_json::to_string(&DedupKey::Quality).unwrap(),
            "\"quality\""
        );
        assert_eq!(DedupKey::default(), DedupKey::Url);
    }

    #[test]
    fn test_merge_change_labels_match_serde() {
        for change in [
            MergeChange::Created,
            MergeChange::StreamAppended,
            MergeChange::StreamRefreshed,
            MergeChange::EpisodeAdded,
            MergeChange::SeasonAdded,
        ] {
            assert_eq!(serde_json::to_value(change).unwrap(), change.as_str());
        }
    }
}

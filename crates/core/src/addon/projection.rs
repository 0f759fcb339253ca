//! Stored documents to protocol shapes. Nothing here touches the store.

use crate::config::AddonConfig;
use crate::media::{MediaDocument, StreamVariant};

use super::{
    CatalogDescriptor, CatalogEntry, ContentType, Manifest, MetaObject, ProtocolId, StreamEntry,
    Video,
};

/// Name shown next to every stream.
pub const STREAM_SOURCE_NAME: &str = "DDL";

pub fn manifest(config: &AddonConfig) -> Manifest {
    Manifest {
        id: config.id.clone(),
        version: config.version.clone(),
        name: config.name.clone(),
        description: config.description.clone(),
        logo: config.logo.clone(),
        types: ContentType::all().to_vec(),
        resources: vec!["catalog", "meta", "stream"],
        catalogs: ContentType::all()
            .into_iter()
            .map(CatalogDescriptor::for_type)
            .collect(),
        id_prefixes: vec![config.id_prefix.clone()],
    }
}

pub fn catalog_entry(document: &MediaDocument, prefix: &str) -> CatalogEntry {
    CatalogEntry {
        id: ProtocolId::title(document.identity.external_id).format(prefix),
        content_type: document.identity.media_type.into(),
        name: document.title.clone(),
        poster: document.poster.clone(),
        year: document.release_year,
        logo: document.logo.clone(),
    }
}

pub fn meta_object(document: &MediaDocument, prefix: &str) -> MetaObject {
    let external_id = document.identity.external_id;

    // Storage order is arrival order; clients want season/episode order.
    let videos = document.seasons().map(|seasons| {
        let mut seasons: Vec<_> = seasons.iter().collect();
        seasons.sort_by_key(|s| s.season_number);

        seasons
            .into_iter()
            .flat_map(|season| {
                let mut episodes: Vec<_> = season.episodes.iter().collect();
                episodes.sort_by_key(|e| e.episode_number);
                episodes.into_iter().map(move |episode| Video {
                    id: ProtocolId::episode(
                        external_id,
                        season.season_number,
                        episode.episode_number,
                    )
                    .format(prefix),
                    title: episode.title.clone(),
                    season: season.season_number,
                    episode: episode.episode_number,
                    thumbnail: episode.backdrop_url.clone(),
                })
            })
            .collect()
    });

    MetaObject {
        id: ProtocolId::title(external_id).format(prefix),
        content_type: document.identity.media_type.into(),
        name: document.title.clone(),
        poster: document.poster.clone(),
        background: document.backdrop.clone(),
        logo: document.logo.clone(),
        description: document.description.clone(),
        year: document.release_year,
        imdb_rating: format!("{:.1}", document.rating),
        genres: document.genres.iter().cloned().collect(),
        videos,
    }
}

/// Streams for a movie, or for one episode when `episode` is given.
/// Anything missing yields an empty list.
pub fn stream_entries(document: &MediaDocument, episode: Option<(u32, u32)>) -> Vec<StreamEntry> {
    let variants = match episode {
        Some((season, episode)) => document
            .episode(season, episode)
            .map(|e| e.streams.as_slice()),
        None => document.streams(),
    };

    variants
        .unwrap_or_default()
        .iter()
        .map(stream_entry)
        .collect()
}

pub fn stream_entry(variant: &StreamVariant) -> StreamEntry {
    StreamEntry {
        name: STREAM_SOURCE_NAME,
        title: format!(
            "{} - {}\n{}",
            variant.quality, variant.size, variant.display_name
        ),
        url: variant.url.clone(),
    }
}

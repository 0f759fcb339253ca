//! Wire shapes of the streaming-addon protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::media::MediaType;

/// Content type as the protocol names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Series => "series",
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            ContentType::Movie => MediaType::Movie,
            ContentType::Series => MediaType::TvShow,
        }
    }

    /// Id of the single catalog declared for this type.
    pub fn catalog_id(&self) -> &'static str {
        match self {
            ContentType::Movie => "ddl_movies",
            ContentType::Series => "ddl_series",
        }
    }

    fn catalog_name(&self) -> &'static str {
        match self {
            ContentType::Movie => "DDL Movies",
            ContentType::Series => "DDL Series",
        }
    }

    pub fn all() -> [ContentType; 2] {
        [ContentType::Movie, ContentType::Series]
    }
}

impl From<MediaType> for ContentType {
    fn from(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Movie => ContentType::Movie,
            MediaType::TvShow => ContentType::Series,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The protocol type is not one this catalog serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContentType(pub String);

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(ContentType::Movie),
            "series" => Ok(ContentType::Series),
            other => Err(UnknownContentType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub logo: String,
    pub types: Vec<ContentType>,
    pub resources: Vec<&'static str>,
    pub catalogs: Vec<CatalogDescriptor>,
    pub id_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogDescriptor {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub id: &'static str,
    pub name: &'static str,
    pub extra: Vec<ExtraField>,
}

impl CatalogDescriptor {
    pub(crate) fn for_type(content_type: ContentType) -> Self {
        Self {
            content_type,
            id: content_type.catalog_id(),
            name: content_type.catalog_name(),
            extra: vec![
                ExtraField {
                    name: "search",
                    is_required: false,
                },
                ExtraField {
                    name: "skip",
                    is_required: false,
                },
            ],
        }
    }
}

/// An optional catalog argument clients may send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraField {
    pub name: &'static str,
    pub is_required: bool,
}

/// One row of a catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Full description of one title.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaObject {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub year: i32,
    pub imdb_rating: String,
    pub genres: Vec<String>,
    /// Series only: every stored episode, in season/episode order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<Video>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub season: u32,
    pub episode: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// One playable link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamEntry {
    pub name: &'static str,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogResponse {
    pub metas: Vec<CatalogEntry>,
}

/// `{"meta": {}}` when nothing matched.
#[derive(Debug, Clone, Serialize)]
pub struct MetaResponse {
    #[serde(serialize_with = "serialize_meta")]
    pub meta: Option<MetaObject>,
}

fn serialize_meta<S: Serializer>(meta: &Option<MetaObject>, serializer: S) -> Result<S::Ok, S::Error> {
    match meta {
        Some(meta) => meta.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamEntry>,
}

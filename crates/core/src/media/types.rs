//! Types for the media document model.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Partition a document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    TvShow,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::TvShow => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::TvShow),
            other => Err(MediaError::InvalidInput(format!(
                "unknown media type '{}' (expected 'movie' or 'tv')",
                other
            ))),
        }
    }
}

/// Primary key of a document: no two documents share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaIdentity {
    pub media_type: MediaType,
    /// Canonical catalog id (TMDB id), unique within `media_type`.
    pub external_id: u32,
}

impl MediaIdentity {
    pub fn movie(external_id: u32) -> Self {
        Self {
            media_type: MediaType::Movie,
            external_id,
        }
    }

    pub fn tv_show(external_id: u32) -> Self {
        Self {
            media_type: MediaType::TvShow,
            external_id,
        }
    }
}

impl fmt::Display for MediaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.external_id)
    }
}

/// One downloadable link for a title (or episode) at one quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamVariant {
    /// Resolution label, e.g. "1080p".
    pub quality: String,
    pub url: String,
    /// Original file name shown to users.
    pub display_name: String,
    /// Human-readable size, e.g. "1.42 GB".
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub episode_number: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub streams: Vec<StreamVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub season_number: u32,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

/// The nested, merge-managed part of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaBody {
    Movie { streams: Vec<StreamVariant> },
    TvShow { seasons: Vec<Season> },
}

impl MediaBody {
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaBody::Movie { .. } => MediaType::Movie,
            MediaBody::TvShow { .. } => MediaType::TvShow,
        }
    }
}

/// A stored catalog title: descriptive fields plus streams or seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDocument {
    #[serde(flatten)]
    pub identity: MediaIdentity,
    pub title: String,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rating: f64,
    pub release_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version; 0 until first stored.
    #[serde(default)]
    pub version: i64,
    #[serde(flatten)]
    pub body: MediaBody,
}

impl MediaDocument {
    /// Streams of a movie, or `None` for a TV show.
    pub fn streams(&self) -> Option<&[StreamVariant]> {
        match &self.body {
            MediaBody::Movie { streams } => Some(streams),
            MediaBody::TvShow { .. } => None,
        }
    }

    /// Seasons of a TV show, or `None` for a movie.
    pub fn seasons(&self) -> Option<&[Season]> {
        match &self.body {
            MediaBody::TvShow { seasons } => Some(seasons),
            MediaBody::Movie { .. } => None,
        }
    }

    /// Find an episode by season and episode number.
    pub fn episode(&self, season_number: u32, episode_number: u32) -> Option<&Episode> {
        self.seasons()?
            .iter()
            .find(|s| s.season_number == season_number)?
            .episodes
            .iter()
            .find(|e| e.episode_number == episode_number)
    }
}

/// The episode a TV registration targets, with freshly resolved metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeTarget {
    pub season_number: u32,
    pub episode_number: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
}

/// Output of the metadata resolver for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    pub identity: MediaIdentity,
    pub title: String,
    pub release_year: i32,
    pub rating: f64,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resolution label of the file, e.g. "720p".
    pub quality: String,
    /// Source link of the file.
    pub url: String,
    /// Present exactly when `identity` is a TV show.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<EpisodeTarget>,
}

impl ResolvedMedia {
    /// Check the shape invariants the merge engine relies on.
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.title.trim().is_empty() {
            return Err(MediaError::InvalidInput("title is required".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(MediaError::InvalidInput("url is required".to_string()));
        }
        if self.quality.trim().is_empty() {
            return Err(MediaError::InvalidInput("quality is required".to_string()));
        }
        match (self.identity.media_type, &self.episode) {
            (MediaType::Movie, Some(_)) => Err(MediaError::InvalidInput(format!(
                "movie {} cannot target an episode",
                self.identity.external_id
            ))),
            (MediaType::TvShow, None) => Err(MediaError::InvalidInput(format!(
                "tv show {} requires a season/episode target",
                self.identity.external_id
            ))),
            _ => Ok(()),
        }
    }
}

/// Descriptive fields that may be edited after creation.
///
/// Identity and nested stream structures are not part of this type, so a
/// patch can never touch them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Keys a patch may never carry.
const PROTECTED_KEYS: &[&str] = &[
    "media_type",
    "external_id",
    "version",
    "streams",
    "seasons",
];

impl DocumentPatch {
    /// Build a patch from an untyped JSON object, rejecting protected keys.
    pub fn from_json(value: serde_json::Value) -> Result<Self, MediaError> {
        let object = value.as_object().ok_or_else(|| {
            MediaError::InvalidInput("patch must be a JSON object".to_string())
        })?;

        if let Some(key) = object.keys().find(|k| PROTECTED_KEYS.contains(&k.as_str())) {
            return Err(MediaError::InvalidInput(format!(
                "field '{}' cannot be updated",
                key
            )));
        }

        let patch: DocumentPatch = serde_json::from_value(value)
            .map_err(|e| MediaError::InvalidInput(format!("invalid patch: {}", e)))?;

        if patch.is_empty() {
            return Err(MediaError::InvalidInput(
                "patch contains no fields".to_string(),
            ));
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self == &DocumentPatch::default()
    }

    /// Apply this patch to a document in memory.
    pub fn apply_to(&self, document: &mut MediaDocument) {
        if let Some(ref title) = self.title {
            document.title = title.clone();
        }
        if let Some(ref genres) = self.genres {
            document.genres = genres.clone();
        }
        if let Some(ref description) = self.description {
            document.description = Some(description.clone());
        }
        if let Some(rating) = self.rating {
            document.rating = rating;
        }
        if let Some(year) = self.release_year {
            document.release_year = year;
        }
        if let Some(ref poster) = self.poster {
            document.poster = Some(poster.clone());
        }
        if let Some(ref backdrop) = self.backdrop {
            document.backdrop = Some(backdrop.clone());
        }
        if let Some(ref logo) = self.logo {
            document.logo = Some(logo.clone());
        }
        if let Some(updated_at) = self.updated_at {
            document.updated_at = updated_at;
        }
    }
}

/// Query for listing documents of one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaListQuery {
    pub media_type: MediaType,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Case-insensitive substring matched against the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Item offset that overrides the page-derived one.
    #[serde(skip)]
    pub skip: Option<u32>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

impl MediaListQuery {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            page: default_page(),
            page_size: default_page_size(),
            search: None,
            skip: None,
        }
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Start `limit` items after the first `offset`, regardless of page boundaries.
    pub fn with_offset(mut self, offset: u32, limit: u32) -> Self {
        self.page_size = limit;
        self.page = offset / limit.max(1) + 1;
        self.skip = Some(offset);
        self
    }

    /// Rows to skip for this page.
    pub fn offset(&self) -> i64 {
        match self.skip {
            Some(skip) => skip as i64,
            None => (self.page.saturating_sub(1) as i64) * self.page_size as i64,
        }
    }
}

/// One page of documents plus the unpaginated match count.
#[derive(Debug, Clone, Serialize)]
pub struct MediaPage {
    pub items: Vec<MediaDocument>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStats {
    pub movie_count: u64,
    pub tv_show_count: u64,
}

/// Errors for media store and registration operations.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Could not resolve media: {0}")]
    ResolutionFailed(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Concurrent update conflict on {identity}, retry the registration")]
    ConcurrentUpdateConflict { identity: MediaIdentity },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),
}

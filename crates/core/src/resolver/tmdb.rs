//! TMDB-backed metadata resolver.
//!
//! Parses the release name, searches TMDB for the title, and builds a
//! [`ResolvedMedia`] from the first hit's details.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::release_name::{parse_release_name, ReleaseName};
use super::{MetadataResolver, ResolveError};
use crate::config::TmdbConfig;
use crate::media::{EpisodeTarget, MediaIdentity, ResolvedMedia};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Resolves file names against The Movie Database.
pub struct TmdbResolver {
    client: Client,
    base_url: String,
    api_key: String,
    image_base_url: String,
}

impl TmdbResolver {
    pub fn new(config: &TmdbConfig) -> Result<Self, ResolveError> {
        if config.api_key.is_empty() {
            return Err(ResolveError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_client(config, client))
    }

    fn with_client(config: &TmdbConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone(),
            image_base_url: config
                .image_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// GET a TMDB resource. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ResolveError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ResolveError::Unauthorized(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolveError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed = response
            .json()
            .await
            .map_err(|e| ResolveError::Parse(format!("{}: {}", path, e)))?;
        Ok(Some(parsed))
    }

    async fn first_search_hit(
        &self,
        kind: &str,
        title: &str,
        year: Option<i32>,
    ) -> Result<Option<u32>, ResolveError> {
        let mut query = vec![("query", title.to_string())];
        if let Some(y) = year {
            let key = if kind == "tv" { "first_air_date_year" } else { "year" };
            query.push((key, y.to_string()));
        }

        debug!("TMDB {} search: query='{}', year={:?}", kind, title, year);

        let results: Option<SearchResponse> =
            self.get_json(&format!("/search/{}", kind), &query).await?;
        Ok(results.and_then(|r| r.results.first().map(|hit| hit.id)))
    }

    async fn resolve_movie(
        &self,
        parsed: &ReleaseName,
        url: &str,
    ) -> Result<Option<ResolvedMedia>, ResolveError> {
        let Some(id) = self.first_search_hit("movie", &parsed.title, parsed.year).await? else {
            return Ok(None);
        };
        let details: Option<MovieDetails> = self.get_json(&format!("/movie/{}", id), &[]).await?;

        Ok(details.map(|d| movie_to_resolved(d, parsed, url, &self.image_base_url)))
    }

    async fn resolve_episode(
        &self,
        parsed: &ReleaseName,
        season: u32,
        episode: u32,
        url: &str,
    ) -> Result<Option<ResolvedMedia>, ResolveError> {
        let Some(id) = self.first_search_hit("tv", &parsed.title, parsed.year).await? else {
            return Ok(None);
        };
        let Some(show): Option<TvDetails> = self.get_json(&format!("/tv/{}", id), &[]).await?
        else {
            return Ok(None);
        };

        let episode_details: Option<EpisodeDetails> = self
            .get_json(
                &format!("/tv/{}/season/{}/episode/{}", id, season, episode),
                &[],
            )
            .await?;
        if episode_details.is_none() {
            // Fresh episodes often land before TMDB lists them.
            warn!(
                "TMDB has no S{:02}E{:02} for '{}', using a placeholder title",
                season, episode, show.name
            );
        }

        Ok(Some(show_to_resolved(
            show,
            episode_details,
            (season, episode),
            parsed,
            url,
            &self.image_base_url,
        )))
    }
}

#[async_trait]
impl MetadataResolver for TmdbResolver {
    async fn resolve(
        &self,
        filename: &str,
        url: &str,
    ) -> Result<Option<ResolvedMedia>, ResolveError> {
        let Some(parsed) = parse_release_name(filename) else {
            warn!("Skipping '{}': missing title or quality", filename);
            return Ok(None);
        };

        match parsed.episode_target() {
            Some((season, episode)) => self.resolve_episode(&parsed, season, episode, url).await,
            None => self.resolve_movie(&parsed, url).await,
        }
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    id: u32,
    title: String,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    vote_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TvDetails {
    id: u32,
    name: String,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    vote_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EpisodeDetails {
    name: String,
    still_path: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

fn image_url(image_base: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}/w500{}", image_base, p))
}

/// Year from a TMDB date ("YYYY-MM-DD"), else the one in the file name.
fn release_year(date: Option<&str>, parsed: &ReleaseName) -> i32 {
    date.and_then(|d| d.get(..4))
        .and_then(|y| y.parse().ok())
        .or(parsed.year)
        .unwrap_or(0)
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

fn movie_to_resolved(
    d: MovieDetails,
    parsed: &ReleaseName,
    url: &str,
    image_base: &str,
) -> ResolvedMedia {
    ResolvedMedia {
        identity: MediaIdentity::movie(d.id),
        release_year: release_year(d.release_date.as_deref(), parsed),
        title: d.title,
        rating: d.vote_average.unwrap_or(0.0),
        genres: d.genres.into_iter().map(|g| g.name).collect(),
        poster: image_url(image_base, d.poster_path.as_deref()),
        backdrop: image_url(image_base, d.backdrop_path.as_deref()),
        logo: None,
        description: non_empty(d.overview),
        quality: parsed.quality.clone(),
        url: url.to_string(),
        episode: None,
    }
}

fn show_to_resolved(
    show: TvDetails,
    episode: Option<EpisodeDetails>,
    (season_number, episode_number): (u32, u32),
    parsed: &ReleaseName,
    url: &str,
    image_base: &str,
) -> ResolvedMedia {
    let target = match episode {
        Some(e) => EpisodeTarget {
            season_number,
            episode_number,
            title: e.name,
            backdrop_url: image_url(image_base, e.still_path.as_deref()),
        },
        None => EpisodeTarget {
            season_number,
            episode_number,
            title: format!("Episode {}", episode_number),
            backdrop_url: None,
        },
    };

    ResolvedMedia {
        identity: MediaIdentity::tv_show(show.id),
        release_year: release_year(show.first_air_date.as_deref(), parsed),
        title: show.name,
        rating: show.vote_average.unwrap_or(0.0),
        genres: show.genres.into_iter().map(|g| g.name).collect(),
        poster: image_url(image_base, show.poster_path.as_deref()),
        backdrop: image_url(image_base, show.backdrop_path.as_deref()),
        logo: None,
        description: non_empty(show.overview),
        quality: parsed.quality.clone(),
        url: url.to_string(),
        episode: Some(target),
    }
}

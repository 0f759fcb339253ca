//! Testing utilities and mock implementations of the link collaborators.
//!
//! The mocks stand in for the TMDB resolver and the HTTP size probe so the
//! full intake and registration path can run without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use ddlshelf_core::testing::{fixtures, MockResolver, MockSizeProbe};
//!
//! let resolver = MockResolver::new();
//! resolver
//!     .set_result("Movie.2020.1080p.mkv", fixtures::resolved_movie(1, "Movie", "1080p", "u"))
//!     .await;
//! ```

mod mock_resolver;
mod mock_size_probe;

pub use mock_resolver::MockResolver;
pub use mock_size_probe::MockSizeProbe;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::media::{EpisodeTarget, MediaIdentity, ResolvedMedia, StreamVariant};

    /// A resolved movie with reasonable defaults.
    pub fn resolved_movie(external_id: u32, title: &str, quality: &str, url: &str) -> ResolvedMedia {
        ResolvedMedia {
            identity: MediaIdentity::movie(external_id),
            title: title.to_string(),
            release_year: 2001,
            rating: 7.4,
            genres: vec!["Drama".to_string(), "Science Fiction".to_string()],
            poster: Some(format!("https://image.tmdb.org/t/p/w500/{}.jpg", external_id)),
            backdrop: Some(format!("https://image.tmdb.org/t/p/w500/{}-bg.jpg", external_id)),
            logo: None,
            description: Some(format!("{} is a film.", title)),
            quality: quality.to_string(),
            url: url.to_string(),
            episode: None,
        }
    }

    /// A resolved TV episode titled "Episode {episode}".
    pub fn resolved_episode(
        external_id: u32,
        title: &str,
        season: u32,
        episode: u32,
        quality: &str,
        url: &str,
    ) -> ResolvedMedia {
        ResolvedMedia {
            identity: MediaIdentity::tv_show(external_id),
            title: title.to_string(),
            release_year: 2015,
            rating: 8.1,
            genres: vec!["Drama".to_string()],
            poster: Some(format!("https://image.tmdb.org/t/p/w500/{}.jpg", external_id)),
            backdrop: None,
            logo: None,
            description: Some(format!("{} is a show.", title)),
            quality: quality.to_string(),
            url: url.to_string(),
            episode: Some(EpisodeTarget {
                season_number: season,
                episode_number: episode,
                title: format!("Episode {}", episode),
                backdrop_url: Some(format!(
                    "https://image.tmdb.org/t/p/w500/{}-s{}e{}.jpg",
                    external_id, season, episode
                )),
            }),
        }
    }

    /// A stream variant with a derived display name and a fixed size.
    pub fn stream_variant(quality: &str, url: &str) -> StreamVariant {
        StreamVariant {
            quality: quality.to_string(),
            url: url.to_string(),
            display_name: format!("file.{}.mkv", quality),
            size: "1.50 GB".to_string(),
        }
    }
}

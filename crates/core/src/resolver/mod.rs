//! Collaborators that turn a raw download link into something registrable.
//!
//! - [`MetadataResolver`]: file name + URL to a [`ResolvedMedia`].
//! - [`SizeProbe`]: URL to a human-readable size.

mod probe;
pub mod release_name;
mod tmdb;

pub use probe::HttpSizeProbe;
pub use release_name::{parse_release_name, ReleaseName};
pub use tmdb::TmdbResolver;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::media::{MediaError, ResolvedMedia};

/// Errors from metadata resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// HTTP request failed (connect, timeout, body).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The metadata API answered with an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The metadata API answered with something we could not read.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The metadata API rejected our credentials.
    #[error("Metadata API rejected credentials: {0}")]
    Unauthorized(String),

    /// No metadata source is configured.
    #[error("Resolver not configured: {0}")]
    NotConfigured(String),
}

impl From<ResolveError> for MediaError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotConfigured(msg) => MediaError::ResolutionFailed(msg),
            other => MediaError::UpstreamUnavailable(other.to_string()),
        }
    }
}

/// Resolves a file name to catalog metadata.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// `Ok(None)` when the name is unparseable or nothing matched.
    async fn resolve(
        &self,
        filename: &str,
        url: &str,
    ) -> Result<Option<ResolvedMedia>, ResolveError>;
}

/// Resolver used when no metadata source is configured.
pub struct UnconfiguredResolver;

#[async_trait]
impl MetadataResolver for UnconfiguredResolver {
    async fn resolve(
        &self,
        _filename: &str,
        _url: &str,
    ) -> Result<Option<ResolvedMedia>, ResolveError> {
        Err(ResolveError::NotConfigured(
            "no metadata source configured ([tmdb] section missing)".to_string(),
        ))
    }
}

/// Errors from size probing.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Connect failure, timeout or broken response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered, but not with a 2xx.
    #[error("link answered with HTTP {0}")]
    Status(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<ProbeError> for MediaError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::InvalidUrl(msg) => MediaError::InvalidInput(msg),
            other => MediaError::UpstreamUnavailable(other.to_string()),
        }
    }
}

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Size of a remote file as reported by its server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeReport {
    Bytes(u64),
    /// Reachable, but no usable `Content-Length`.
    Unknown,
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SizeReport::Bytes(bytes) if bytes as f64 >= GIB => {
                write!(f, "{:.2} GB", bytes as f64 / GIB)
            }
            SizeReport::Bytes(bytes) => write!(f, "{:.2} MB", bytes as f64 / MIB),
            SizeReport::Unknown => write!(f, "unknown"),
        }
    }
}

/// Finds out how big a remote file is without downloading it.
#[async_trait]
pub trait SizeProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<SizeReport, ProbeError>;
}

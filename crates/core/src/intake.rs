//! Turning a raw download link into a registrable variant.

use std::sync::Arc;

use tracing::{info, warn};

use crate::media::{MediaError, ResolvedMedia};
use crate::resolver::{MetadataResolver, SizeProbe};

/// A link whose metadata and size are both known.
#[derive(Debug, Clone)]
pub struct PreparedLink {
    pub resolved: ResolvedMedia,
    /// Human-readable size, e.g. "1.50 GB" or "unknown".
    pub size: String,
    /// File name shown under the stream title.
    pub display_name: String,
}

/// Runs the collaborators for a submitted link. Writes nothing.
pub struct LinkIntake {
    resolver: Arc<dyn MetadataResolver>,
    probe: Arc<dyn SizeProbe>,
}

impl LinkIntake {
    pub fn new(resolver: Arc<dyn MetadataResolver>, probe: Arc<dyn SizeProbe>) -> Self {
        Self { resolver, probe }
    }

    /// Probe the link's size, then resolve its metadata.
    ///
    /// Either collaborator failing aborts the whole intake.
    pub async fn prepare(&self, url: &str) -> Result<PreparedLink, MediaError> {
        let url = url.trim();
        let display_name = filename_from_url(url)?;

        let size = self.probe.probe(url).await?;

        let resolved = self
            .resolver
            .resolve(&display_name, url)
            .await?
            .ok_or_else(|| {
                warn!("No metadata found for '{}'", display_name);
                MediaError::ResolutionFailed(format!(
                    "could not parse metadata from filename '{}'",
                    display_name
                ))
            })?;

        info!(
            "Resolved '{}' as {} '{}' [{}], size {}",
            display_name, resolved.identity, resolved.title, resolved.quality, size
        );

        Ok(PreparedLink {
            resolved,
            size: size.to_string(),
            display_name,
        })
    }
}

/// Percent-decoded last path segment of `url`.
pub fn filename_from_url(url: &str) -> Result<String, MediaError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| MediaError::InvalidInput(format!("invalid url '{}': {}", url, e)))?;

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .ok_or_else(|| MediaError::InvalidInput(format!("url '{}' has no file name", url)))?;

    let decoded = urlencoding::decode(segment)
        .map_err(|e| MediaError::InvalidInput(format!("bad percent-encoding in '{}': {}", url, e)))?;

    Ok(decoded.into_owned())
}

//! HEAD-request size probe.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use tracing::debug;

use super::{ProbeError, SizeProbe, SizeReport};

/// Reads `Content-Length` from a HEAD request, following redirects.
pub struct HttpSizeProbe {
    client: Client,
}

impl HttpSizeProbe {
    /// `timeout` bounds the whole request, redirects included.
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    /// Use a preconfigured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SizeProbe for HttpSizeProbe {
    async fn probe(&self, url: &str) -> Result<SizeReport, ProbeError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| ProbeError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProbeError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let response = self.client.head(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let report = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(SizeReport::Bytes)
            .unwrap_or(SizeReport::Unknown);

        debug!("Probed {}: {}", url, report);
        Ok(report)
    }
}

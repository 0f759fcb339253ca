//! Mock size probe for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::resolver::{ProbeError, SizeProbe, SizeReport};

/// Mock implementation of the SizeProbe trait.
///
/// URLs without a configured report probe as [`SizeReport::Unknown`].
#[derive(Debug)]
pub struct MockSizeProbe {
    reports: Arc<RwLock<HashMap<String, SizeReport>>>,
    probed: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<ProbeError>>>,
}

impl Default for MockSizeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSizeProbe {
    pub fn new() -> Self {
        Self {
            reports: Arc::new(RwLock::new(HashMap::new())),
            probed: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_report(&self, url: &str, report: SizeReport) {
        self.reports.write().await.insert(url.to_string(), report);
    }

    pub async fn set_next_error(&self, error: ProbeError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn probed_urls(&self) -> Vec<String> {
        self.probed.read().await.clone()
    }
}

#[async_trait]
impl SizeProbe for MockSizeProbe {
    async fn probe(&self, url: &str) -> Result<SizeReport, ProbeError> {
        self.probed.write().await.push(url.to_string());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(self
            .reports
            .read()
            .await
            .get(url)
            .copied()
            .unwrap_or(SizeReport::Unknown))
    }
}

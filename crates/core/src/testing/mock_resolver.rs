//! Mock metadata resolver for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::ResolvedMedia;
use crate::resolver::{MetadataResolver, ResolveError};

/// Mock implementation of the MetadataResolver trait.
///
/// Results are keyed by file name; unknown names resolve to `None`.
/// Every call is recorded.
#[derive(Debug)]
pub struct MockResolver {
    results: Arc<RwLock<HashMap<String, ResolvedMedia>>>,
    names: Arc<RwLock<Vec<String>>>,
    /// If set, the next call fails with this error.
    next_error: Arc<RwLock<Option<ResolveError>>>,
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResolver {
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(HashMap::new())),
            names: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Resolve `filename` to `resolved`. The resolved url is replaced by
    /// the one the caller passes in.
    pub async fn set_result(&self, filename: &str, resolved: ResolvedMedia) {
        self.results
            .write()
            .await
            .insert(filename.to_string(), resolved);
    }

    pub async fn set_next_error(&self, error: ResolveError) {
        *self.next_error.write().await = Some(error);
    }

    /// File names seen so far, in call order.
    pub async fn recorded_names(&self) -> Vec<String> {
        self.names.read().await.clone()
    }
}

#[async_trait]
impl MetadataResolver for MockResolver {
    async fn resolve(
        &self,
        filename: &str,
        url: &str,
    ) -> Result<Option<ResolvedMedia>, ResolveError> {
        self.names.write().await.push(filename.to_string());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(self.results.read().await.get(filename).cloned().map(|mut r| {
            r.url = url.to_string();
            r
        }))
    }
}

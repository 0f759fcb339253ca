//! The streaming-addon catalog protocol.
//!
//! Read-only: [`AddonService`] looks documents up in the store and hands
//! them to the pure projections in [`projection`]. Unknown types, unknown
//! ids and malformed ids all produce empty responses rather than errors.

mod id;
pub mod projection;
mod types;

pub use id::ProtocolId;
pub use types::*;

use std::sync::Arc;

use tracing::debug;

use crate::config::AddonConfig;
use crate::media::{MediaError, MediaIdentity, MediaListQuery, MediaStore, MAX_PAGE_SIZE};

/// Catalog arguments from the `{extra}` path segment, e.g. `search=foo&skip=100`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogExtra {
    pub search: Option<String>,
    pub skip: u32,
}

impl CatalogExtra {
    /// Lenient: unknown keys and unparseable values are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut extra = Self::default();
        for pair in raw.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            match key {
                "search" if !value.trim().is_empty() => extra.search = Some(value),
                "skip" => extra.skip = value.parse().unwrap_or(0),
                _ => {}
            }
        }
        extra
    }
}

/// Serves manifest, catalog, meta and stream requests from the store.
pub struct AddonService {
    store: Arc<dyn MediaStore>,
    config: AddonConfig,
}

impl AddonService {
    pub fn new(store: Arc<dyn MediaStore>, config: AddonConfig) -> Self {
        Self { store, config }
    }

    pub fn manifest(&self) -> Manifest {
        projection::manifest(&self.config)
    }

    /// Most recently updated titles first, one page of `catalog_page_size`.
    pub fn catalog(
        &self,
        content_type: &str,
        catalog_id: &str,
        extra: &CatalogExtra,
    ) -> Result<Vec<CatalogEntry>, MediaError> {
        let Ok(content_type) = content_type.parse::<ContentType>() else {
            debug!("Catalog request for unknown type '{}'", content_type);
            return Ok(Vec::new());
        };
        if catalog_id != content_type.catalog_id() {
            debug!("Catalog request for unknown catalog '{}'", catalog_id);
            return Ok(Vec::new());
        }

        let page_size = self.config.catalog_page_size.clamp(1, MAX_PAGE_SIZE);
        let mut query =
            MediaListQuery::new(content_type.media_type()).with_offset(extra.skip, page_size);
        if let Some(search) = &extra.search {
            query = query.with_search(search.clone());
        }

        let page = self.store.list(&query)?;
        Ok(page
            .items
            .iter()
            .map(|doc| projection::catalog_entry(doc, &self.config.id_prefix))
            .collect())
    }

    /// `Ok(None)` when the id is not ours or nothing is stored under it.
    pub fn meta(&self, content_type: &str, id: &str) -> Result<Option<MetaObject>, MediaError> {
        let Some(identity) = self.identity(content_type, id).map(|(identity, _)| identity) else {
            return Ok(None);
        };

        Ok(self
            .store
            .find(&identity)?
            .map(|doc| projection::meta_object(&doc, &self.config.id_prefix)))
    }

    /// Movies use `<prefix><id>`; series need `<prefix><id>:<season>:<episode>`.
    pub fn streams(&self, content_type: &str, id: &str) -> Result<Vec<StreamEntry>, MediaError> {
        let Some((identity, protocol_id)) = self.identity(content_type, id) else {
            return Ok(Vec::new());
        };

        let target = match content_type.parse::<ContentType>() {
            Ok(ContentType::Series) => match protocol_id.episode {
                Some(target) => Some(target),
                None => return Ok(Vec::new()),
            },
            _ => None,
        };

        Ok(self
            .store
            .find(&identity)?
            .map(|doc| projection::stream_entries(&doc, target))
            .unwrap_or_default())
    }

    fn identity(&self, content_type: &str, id: &str) -> Option<(MediaIdentity, ProtocolId)> {
        let content_type = content_type.parse::<ContentType>().ok()?;
        let protocol_id = ProtocolId::parse(&self.config.id_prefix, id)?;
        let identity = MediaIdentity {
            media_type: content_type.media_type(),
            external_id: protocol_id.external_id,
        };
        Some((identity, protocol_id))
    }
}

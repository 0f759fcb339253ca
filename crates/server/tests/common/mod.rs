//! Common test utilities for in-process HTTP testing with mocks.
//!
//! The fixture builds the full router around an on-disk SQLite store and
//! mock collaborators, so tests exercise every route without network access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use ddlshelf_core::{
    create_authenticator, load_config_from_str,
    testing::{MockResolver, MockSizeProbe},
    Config, MediaStore, SqliteMediaStore,
};
use ddlshelf_server::state::AppState;

/// Re-export fixtures for test convenience
pub use ddlshelf_core::testing::fixtures;

/// API key used when the fixture is built with api_key auth.
pub const TEST_API_KEY: &str = "test-secret";

/// In-process server with controllable collaborators.
pub struct TestFixture {
    pub router: Router,
    pub store: Arc<SqliteMediaStore>,
    /// Configure metadata results per file name
    pub resolver: Arc<MockResolver>,
    /// Configure size reports per URL
    pub probe: Arc<MockSizeProbe>,
    /// Sent as `X-API-Key` on every request when set
    api_key: Option<String>,
    _temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with auth disabled.
    pub fn new() -> Self {
        Self::from_toml("[auth]\nmethod = \"none\"\n")
    }

    /// Fixture with api_key auth; requests carry the key unless sent via `request_without_key`.
    pub fn with_api_key() -> Self {
        let mut fixture = Self::from_toml(&format!(
            "[auth]\nmethod = \"api_key\"\napi_key = \"{}\"\n",
            TEST_API_KEY
        ));
        fixture.api_key = Some(TEST_API_KEY.to_string());
        fixture
    }

    /// Fixture from a TOML config body; the database path is always a temp file.
    pub fn from_toml(toml: &str) -> Self {
        Self::from_toml_with_store(toml, |store| store as Arc<dyn MediaStore>)
    }

    /// Like `from_toml`, but the app sees whatever `wrap` builds around the
    /// SQLite store. `self.store` stays the inner store.
    pub fn from_toml_with_store(
        toml: &str,
        wrap: impl FnOnce(Arc<SqliteMediaStore>) -> Arc<dyn MediaStore>,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config: Config = load_config_from_str(toml).expect("Invalid test config");
        config.database.path = temp_dir.path().join("test.db");

        let store = Arc::new(
            SqliteMediaStore::new(&config.database.path).expect("Failed to create store"),
        );
        let resolver = Arc::new(MockResolver::new());
        let probe = Arc::new(MockSizeProbe::new());
        let authenticator =
            Arc::from(create_authenticator(&config.auth).expect("Failed to create authenticator"));

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            wrap(Arc::clone(&store)),
            Arc::clone(&resolver) as Arc<dyn ddlshelf_core::MetadataResolver>,
            Arc::clone(&probe) as Arc<dyn ddlshelf_core::SizeProbe>,
        ));

        Self {
            router: ddlshelf_server::api::create_router(state),
            store,
            resolver,
            probe,
            api_key: None,
            _temp_dir: temp_dir,
        }
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, true).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), true).await
    }

    /// Send a PATCH request with JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.request("PATCH", path, Some(body), true).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None, true).await
    }

    /// Send a request without the fixture's API key.
    pub async fn request_without_key(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> TestResponse {
        self.request(method, path, body, false).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = self.build_request("GET", path, None, true);
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn build_request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        with_key: bool,
    ) -> Request<Body> {
        let mut request_builder = Request::builder().method(method).uri(path);

        if with_key {
            if let Some(key) = &self.api_key {
                request_builder = request_builder.header("X-API-Key", key);
            }
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        request_builder.body(body).unwrap()
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        with_key: bool,
    ) -> TestResponse {
        let request = self.build_request(method, path, body, with_key);

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

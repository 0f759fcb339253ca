//! Administrative API tests: link registration, media CRUD, auth, metrics.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use ddlshelf_core::resolver::{ProbeError, ResolveError};
use ddlshelf_core::{MediaIdentity, MediaStore};

use common::{fixtures, TestFixture};

async fn seed_movie(fixture: &TestFixture, external_id: u32, title: &str) {
    let file_name = format!("{}.{}.1080p.mkv", title.replace(' ', "."), external_id);
    fixture
        .resolver
        .set_result(
            &file_name,
            fixtures::resolved_movie(external_id, title, "1080p", ""),
        )
        .await;
    let response = fixture
        .post(
            "/api/v1/links",
            json!({ "url": format!("https://dl.example/{}", file_name) }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
}

// =============================================================================
// Health and config
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let fixture = TestFixture::with_api_key();

    let response = fixture.request_without_key("GET", "/api/v1/health", None).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::with_api_key();

    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["auth"]["method"], "api_key");
    assert_eq!(response.body["auth"]["api_key_configured"], true);
    assert!(!response.body.to_string().contains(common::TEST_API_KEY));
}

// =============================================================================
// Link registration
// =============================================================================

#[tokio::test]
async fn test_add_link_creates_document() {
    let fixture = TestFixture::new();
    fixture
        .resolver
        .set_result(
            "Arrival.2016.2160p.mkv",
            fixtures::resolved_movie(329865, "Arrival", "2160p", ""),
        )
        .await;

    let response = fixture
        .post(
            "/api/v1/links",
            json!({ "url": "https://dl.example/movies/Arrival.2016.2160p.mkv" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body["message"],
        "Successfully processed and added 'Arrival'"
    );
    assert_eq!(response.body["title"], "Arrival");
    assert_eq!(response.body["change"], "created");
    assert_eq!(response.body["media_type"], "movie");
    assert_eq!(response.body["external_id"], 329865);

    let stored = fixture
        .store
        .find(&MediaIdentity::movie(329865))
        .unwrap()
        .unwrap();
    let streams = stored.streams().unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].display_name, "Arrival.2016.2160p.mkv");
    assert_eq!(streams[0].size, "unknown");
}

#[tokio::test]
async fn test_add_link_decodes_file_name() {
    let fixture = TestFixture::new();
    fixture
        .resolver
        .set_result(
            "Movie Name (2019) 720p.mp4",
            fixtures::resolved_movie(11, "Movie Name", "720p", ""),
        )
        .await;

    let response = fixture
        .post(
            "/api/v1/links",
            json!({ "url": "https://dl.example/Movie%20Name%20(2019)%20720p.mp4" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        fixture.resolver.recorded_names().await,
        vec!["Movie Name (2019) 720p.mp4".to_string()]
    );
}

#[tokio::test]
async fn test_second_episode_reports_episode_added() {
    let fixture = TestFixture::new();
    for (episode, expected) in [(1, "created"), (2, "episode_added")] {
        let file_name = format!("Show.S01E0{}.1080p.mkv", episode);
        fixture
            .resolver
            .set_result(
                &file_name,
                fixtures::resolved_episode(1399, "Show", 1, episode, "1080p", ""),
            )
            .await;
        let response = fixture
            .post(
                "/api/v1/links",
                json!({ "url": format!("https://dl.example/{}", file_name) }),
            )
            .await;
        assert_status!(response, StatusCode::OK);
        assert_eq!(response.body["change"], expected);
    }
}

#[tokio::test]
async fn test_unresolvable_link_is_rejected_and_nothing_written() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/links",
            json!({ "url": "https://dl.example/random-file.bin" }),
        )
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("random-file.bin"));

    let stats = fixture.get("/api/v1/media/stats").await;
    assert_eq!(stats.body["movie_count"], 0);
    assert_eq!(stats.body["tv_show_count"], 0);
}

#[tokio::test]
async fn test_probe_failure_maps_to_bad_gateway() {
    let fixture = TestFixture::new();
    fixture
        .resolver
        .set_result("a.1080p.mkv", fixtures::resolved_movie(1, "A", "1080p", ""))
        .await;
    fixture.probe.set_next_error(ProbeError::Status(404)).await;

    let response = fixture
        .post("/api/v1/links", json!({ "url": "https://dl.example/a.1080p.mkv" }))
        .await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_eq!(
        fixture.probe.probed_urls().await,
        vec!["https://dl.example/a.1080p.mkv".to_string()]
    );
    // Probe failure aborts before resolution
    assert!(fixture.resolver.recorded_names().await.is_empty());
    assert!(fixture.store.find(&MediaIdentity::movie(1)).unwrap().is_none());
}

#[tokio::test]
async fn test_resolver_outage_maps_to_bad_gateway() {
    let fixture = TestFixture::new();
    fixture
        .resolver
        .set_next_error(ResolveError::Api {
            status: 503,
            message: "maintenance".to_string(),
        })
        .await;

    let response = fixture
        .post("/api/v1/links", json!({ "url": "https://dl.example/a.1080p.mkv" }))
        .await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_invalid_link_bodies() {
    let fixture = TestFixture::new();

    let empty = fixture.post("/api/v1/links", json!({ "url": "  " })).await;
    assert_status!(empty, StatusCode::BAD_REQUEST);

    let not_a_url = fixture.post("/api/v1/links", json!({ "url": "nope" })).await;
    assert_status!(not_a_url, StatusCode::BAD_REQUEST);

    let missing_field = fixture.post("/api/v1/links", json!({})).await;
    assert!(missing_field.status.is_client_error());
}

// =============================================================================
// Media CRUD
// =============================================================================

#[tokio::test]
async fn test_list_paginates_with_total() {
    let fixture = TestFixture::new();
    for id in 1..=15 {
        seed_movie(&fixture, id, &format!("Movie {}", id)).await;
    }

    let response = fixture.get("/api/v1/media/movie?page=2&page_size=10").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["items"].as_array().unwrap().len(), 5);
    assert_eq!(response.body["total"], 15);
    assert_eq!(response.body["page"], 2);
    assert_eq!(response.body["page_size"], 10);
}

#[tokio::test]
async fn test_list_search() {
    let fixture = TestFixture::new();
    seed_movie(&fixture, 1, "Blade Runner").await;
    seed_movie(&fixture, 2, "Arrival").await;

    let response = fixture.get("/api/v1/media/movie?search=runner").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["items"][0]["title"], "Blade Runner");
}

#[tokio::test]
async fn test_list_rejects_bad_input() {
    let fixture = TestFixture::new();

    let bad_type = fixture.get("/api/v1/media/podcast").await;
    assert_status!(bad_type, StatusCode::BAD_REQUEST);

    let bad_page = fixture.get("/api/v1/media/movie?page=0").await;
    assert_status!(bad_page, StatusCode::BAD_REQUEST);

    let huge_page = fixture.get("/api/v1/media/tv?page_size=100000").await;
    assert_status!(huge_page, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_media() {
    let fixture = TestFixture::new();
    seed_movie(&fixture, 603, "The Matrix").await;

    let found = fixture.get("/api/v1/media/movie/603").await;
    assert_status!(found, StatusCode::OK);
    assert_eq!(found.body["title"], "The Matrix");
    assert_eq!(found.body["external_id"], 603);
    assert_eq!(found.body["streams"].as_array().unwrap().len(), 1);

    let other_partition = fixture.get("/api/v1/media/tv/603").await;
    assert_status!(other_partition, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_updates_descriptive_fields_only() {
    let fixture = TestFixture::new();
    seed_movie(&fixture, 603, "The Matrix").await;

    let response = fixture
        .patch(
            "/api/v1/media/movie/603",
            json!({ "title": "The Matrix (Remastered)", "rating": 8.7 }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["title"], "The Matrix (Remastered)");
    assert_eq!(response.body["rating"], 8.7);
    assert_eq!(response.body["streams"].as_array().unwrap().len(), 1);

    let meta = fixture.get("/stremio/meta/movie/ddl-603.json").await;
    assert_eq!(meta.body["meta"]["name"], "The Matrix (Remastered)");
}

#[tokio::test]
async fn test_patch_rejects_protected_and_unknown_fields() {
    let fixture = TestFixture::new();
    seed_movie(&fixture, 603, "The Matrix").await;

    for body in [
        json!({ "streams": [] }),
        json!({ "external_id": 1 }),
        json!({ "media_type": "tv" }),
        json!({ "not_a_field": true }),
        json!({}),
        json!(["title"]),
    ] {
        let response = fixture.patch("/api/v1/media/movie/603", body.clone()).await;
        assert_status!(response, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_patch_missing_document() {
    let fixture = TestFixture::new();

    let response = fixture
        .patch("/api/v1/media/movie/1", json!({ "title": "Ghost" }))
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_media() {
    let fixture = TestFixture::new();
    seed_movie(&fixture, 603, "The Matrix").await;

    let deleted = fixture.delete("/api/v1/media/movie/603").await;
    assert_status!(deleted, StatusCode::NO_CONTENT);

    let again = fixture.delete("/api/v1/media/movie/603").await;
    assert_status!(again, StatusCode::NOT_FOUND);

    let streams = fixture.get("/stremio/stream/movie/ddl-603.json").await;
    assert_eq!(streams.body["streams"], json!([]));
}

#[tokio::test]
async fn test_stats() {
    let fixture = TestFixture::new();
    seed_movie(&fixture, 1, "A").await;
    seed_movie(&fixture, 2, "B").await;

    let response = fixture.get("/api/v1/media/stats").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["movie_count"], 2);
    assert_eq!(response.body["tv_show_count"], 0);
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_admin_routes_require_key() {
    let fixture = TestFixture::with_api_key();

    for (method, path, body) in [
        ("GET", "/api/v1/config", None),
        ("GET", "/api/v1/media/stats", None),
        ("GET", "/api/v1/media/movie", None),
        ("DELETE", "/api/v1/media/movie/1", None),
        (
            "POST",
            "/api/v1/links",
            Some(json!({ "url": "https://dl.example/a.mkv" })),
        ),
    ] {
        let response = fixture.request_without_key(method, path, body).await;
        assert_status!(response, StatusCode::UNAUTHORIZED);
    }

    let with_key = fixture.get("/api/v1/media/stats").await;
    assert_status!(with_key, StatusCode::OK);
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    seed_movie(&fixture, 1, "A").await;

    let (status, body) = fixture.get_text("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ddlshelf_registrations_total"));
    assert!(body.contains("ddlshelf_media_documents"));
    assert!(body.contains("ddlshelf_http_requests_total"));
}

//! Prometheus metrics for observability.
//!
//! - HTTP request metrics (latency, counts, in flight)
//! - Authentication failures
//! - Link registration outcomes
//! - Stored document counts (collected when scraped)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

use ddlshelf_core::MediaType;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ddlshelf_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ddlshelf_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ddlshelf_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures by reason.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ddlshelf_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Registration Metrics
// =============================================================================

/// Submitted links by outcome: the merge change on success, the error kind otherwise.
pub static REGISTRATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ddlshelf_registrations_total",
            "Link registrations by outcome",
        ),
        &["outcome"],
    )
    .unwrap()
});

/// Registrations that had to be recomputed after losing a write race.
pub static REGISTRATION_CONFLICT_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ddlshelf_registration_conflict_retries_total",
        "Registration attempts retried after a concurrent update conflict",
    )
    .unwrap()
});

// =============================================================================
// Store Metrics (collected dynamically)
// =============================================================================

pub static MEDIA_DOCUMENTS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("ddlshelf_media_documents", "Stored documents by media type"),
        &["media_type"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Registration
    registry
        .register(Box::new(REGISTRATIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(REGISTRATION_CONFLICT_RETRIES.clone()))
        .unwrap();

    // Store
    registry
        .register(Box::new(MEDIA_DOCUMENTS.clone()))
        .unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Refresh gauges that mirror store state. Called right before encoding.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    match state.store().stats() {
        Ok(stats) => {
            MEDIA_DOCUMENTS
                .with_label_values(&[MediaType::Movie.as_str()])
                .set(stats.movie_count as i64);
            MEDIA_DOCUMENTS
                .with_label_values(&[MediaType::TvShow.as_str()])
                .set(stats.tv_show_count as i64);
        }
        Err(e) => warn!("Could not collect document counts: {}", e),
    }
}

static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+(/|$)").expect("numeric segment regex"));
static PROTOCOL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(meta|stream)/([a-z]+)/[^/]+").expect("protocol id regex"));
static CATALOG_EXTRA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*/catalog/[^/]+/[^/]+)/[^/]+$").expect("catalog extra regex"));

/// Normalize a path for metric labels (replace ids and free text with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = PROTOCOL_ID.replace_all(path, "/$1/$2/{id}");
    let result = CATALOG_EXTRA.replace_all(&result, "$1/{extra}");
    // Run twice so adjacent numeric segments are both replaced.
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_admin_ids() {
        assert_eq!(normalize_path("/api/v1/media/movie/603"), "/api/v1/media/movie/{id}");
        assert_eq!(normalize_path("/api/v1/media/stats"), "/api/v1/media/stats");
    }

    #[test]
    fn test_normalize_path_protocol_ids() {
        assert_eq!(
            normalize_path("/stremio/stream/series/ddl-1399:1:2.json"),
            "/stremio/stream/series/{id}"
        );
        assert_eq!(
            normalize_path("/stremio/meta/movie/ddl-603.json"),
            "/stremio/meta/movie/{id}"
        );
    }

    #[test]
    fn test_normalize_path_catalog_extra() {
        assert_eq!(
            normalize_path("/stremio/catalog/movie/ddl_movies/search=matrix.json"),
            "/stremio/catalog/movie/ddl_movies/{extra}"
        );
        assert_eq!(
            normalize_path("/stremio/catalog/movie/ddl_movies.json"),
            "/stremio/catalog/movie/ddl_movies.json"
        );
    }

    #[test]
    fn test_normalize_path_adjacent_numbers() {
        assert_eq!(normalize_path("/a/12/34"), "/a/{id}/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();
        REGISTRATIONS_TOTAL.with_label_values(&["created"]).inc();
        MEDIA_DOCUMENTS.with_label_values(&["movie"]).set(0);

        let output = encode_metrics();
        assert!(output.contains("ddlshelf_http_requests_total"));
        assert!(output.contains("ddlshelf_registrations_total"));
        assert!(output.contains("ddlshelf_media_documents"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}

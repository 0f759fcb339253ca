use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ddlshelf_core::{
    config_path, create_authenticator, load_config, validate_config, Authenticator, HttpSizeProbe,
    MediaStore, MetadataResolver, SizeProbe, SqliteMediaStore, TmdbResolver,
    UnconfiguredResolver,
};

use ddlshelf_server::api::create_router;
use ddlshelf_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = config_path();

    info!("ddlshelf {} loading configuration from {:?}", VERSION, config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded (hash {})", &config_hash[..16]);
    info!("Auth method: {}", config.auth.method.as_str());
    info!("Database path: {:?}", config.database.path);
    info!("Dedup key: {:?}", config.registration.dedup_key);

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let store: Arc<dyn MediaStore> = Arc::new(
        SqliteMediaStore::new(&config.database.path).context("Failed to open media store")?,
    );
    info!("Media store initialized");

    let resolver: Arc<dyn MetadataResolver> = match &config.tmdb {
        Some(tmdb_config) => {
            info!("Initializing TMDB resolver");
            Arc::new(TmdbResolver::new(tmdb_config).context("Failed to create TMDB resolver")?)
        }
        None => {
            warn!("No [tmdb] section configured; submitted links will not resolve");
            Arc::new(UnconfiguredResolver)
        }
    };

    let probe: Arc<dyn SizeProbe> = Arc::new(
        HttpSizeProbe::new(Duration::from_secs(config.probe.timeout_secs))
            .context("Failed to create size probe")?,
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);

    let state = Arc::new(AppState::new(
        config,
        authenticator,
        store,
        resolver,
        probe,
    ));

    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

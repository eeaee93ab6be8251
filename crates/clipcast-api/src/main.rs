//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipcast_api::{create_router, metrics, ApiConfig, AppState};
use clipcast_api::services::{
    publisher_registry_from_env, AnalyzerServiceClient, TranscriptionServiceClient,
};
use clipcast_pipeline::{IngestGateway, PipelineConfig, PipelineCoordinator};
use clipcast_providers::{FsMediaStore, HttpDownloadAdapter, MediaNormalizer, MediaStore};
use clipcast_publish::{DispatchSweeper, PublishConfig, SchedulingService};
use clipcast_store::{MemoryStore, Store};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("clipcast=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("Starting clipcast-api");

    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    if let Err(e) = std::fs::create_dir_all(&config.media_root) {
        error!("Failed to create media root {}: {}", config.media_root, e);
        std::process::exit(1);
    }

    let transcribe_url = match std::env::var("TRANSCRIBE_SERVICE_URL") {
        Ok(u) => u,
        Err(_) => {
            error!("TRANSCRIBE_SERVICE_URL not configured");
            std::process::exit(1);
        }
    };
    let analyzer_url = match std::env::var("ANALYZER_SERVICE_URL") {
        Ok(u) => u,
        Err(_) => {
            error!("ANALYZER_SERVICE_URL not configured");
            std::process::exit(1);
        }
    };

    let pipeline_config = PipelineConfig::from_env();
    let publish_config = PublishConfig::from_env();
    let provider_timeout = pipeline_config.provider_timeout;

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let media_store: Arc<dyn MediaStore> = Arc::new(FsMediaStore::new(&config.media_root));

    let downloader = Arc::new(HttpDownloadAdapter::new(
        Arc::clone(&media_store),
        provider_timeout,
        pipeline_config.max_upload_bytes,
    ));
    let transcriber = Arc::new(TranscriptionServiceClient::new(
        transcribe_url.clone(),
        provider_timeout,
    ));
    // The transcription sidecar also exposes the normalization endpoint
    let normalizer: Arc<dyn MediaNormalizer> = Arc::new(TranscriptionServiceClient::new(
        transcribe_url,
        provider_timeout,
    ));
    let analyzer = Arc::new(AnalyzerServiceClient::new(analyzer_url, provider_timeout));

    let gateway = Arc::new(IngestGateway::new(
        Arc::clone(&store),
        Arc::clone(&media_store),
        pipeline_config.max_upload_bytes,
    ));
    let coordinator = Arc::new(PipelineCoordinator::new(
        Arc::clone(&store),
        downloader,
        transcriber,
        Some(normalizer),
        analyzer,
        pipeline_config,
    ));
    let scheduler = Arc::new(SchedulingService::new(Arc::clone(&store)));

    let registry = publisher_registry_from_env(publish_config.publish_timeout);
    let sweeper = Arc::new(DispatchSweeper::new(
        Arc::clone(&store),
        registry,
        publish_config,
    ));

    // Initialize metrics
    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);
    let metrics_handle = if metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics())
    } else {
        None
    };

    // Background loops, stopped via the shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(Arc::clone(&coordinator).run(shutdown_rx.clone()));
    tokio::spawn(Arc::clone(&sweeper).run(shutdown_rx));

    let state = AppState::new(config.clone(), store, gateway, scheduler, coordinator);
    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(a) => a,
        Err(e) => {
            error!("Invalid bind address: {}", e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    let _ = shutdown_tx.send(true);
    // Give background loops a moment to observe shutdown
    tokio::time::sleep(Duration::from_millis(100)).await;
    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}

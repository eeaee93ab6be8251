//! API routes.

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::accounts::upsert_account;
use crate::handlers::clips::{delete_clip, list_video_clips, review_clip};
use crate::handlers::health;
use crate::handlers::posts::{approve_post, create_post, get_post, list_posts};
use crate::handlers::videos::{
    delete_video, get_video_status, import_video, reanalyze_video, upload_video,
};
use crate::metrics::metrics_middleware;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let video_routes = Router::new()
        .route("/videos/upload", post(upload_video))
        .route("/videos/import", post(import_video))
        .route("/videos/:video_id", get(get_video_status))
        .route("/videos/:video_id", delete(delete_video))
        .route("/videos/:video_id/clips", get(list_video_clips))
        .route("/videos/:video_id/reanalyze", post(reanalyze_video));

    let clip_routes = Router::new()
        .route("/clips/:clip_id/review", post(review_clip))
        .route("/clips/:clip_id", delete(delete_clip));

    let post_routes = Router::new()
        .route("/posts", post(create_post))
        .route("/posts", get(list_posts))
        .route("/posts/:post_id", get(get_post))
        .route("/posts/:post_id/approve", post(approve_post));

    let account_routes = Router::new().route("/accounts", put(upsert_account));

    let api_routes = Router::new()
        .merge(video_routes)
        .merge(clip_routes)
        .merge(post_routes)
        .merge(account_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

//! Prometheus metrics.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Metric names.
pub mod names {
    pub const HTTP_REQUESTS: &str = "clipcast_http_requests_total";
    pub const HTTP_DURATION: &str = "clipcast_http_request_duration_seconds";
    pub const VIDEOS_CREATED: &str = "clipcast_videos_created_total";
    pub const CLIP_REVIEWS: &str = "clipcast_clip_reviews_total";
    pub const POSTS_CREATED: &str = "clipcast_posts_created_total";
}

/// Install the Prometheus recorder and return the render handle.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder")
}

/// Record a created video by source.
pub fn record_video_created(source: &'static str) {
    counter!(names::VIDEOS_CREATED, "source" => source).increment(1);
}

/// Record a reviewer decision.
pub fn record_clip_review(decision: &'static str) {
    counter!(names::CLIP_REVIEWS, "decision" => decision).increment(1);
}

/// Record a created scheduled post.
pub fn record_post_created() {
    counter!(names::POSTS_CREATED).increment(1);
}

/// Request counter/latency middleware.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    counter!(names::HTTP_REQUESTS, "method" => method.clone(), "status" => status).increment(1);
    histogram!(names::HTTP_DURATION, "method" => method).record(start.elapsed().as_secs_f64());

    response
}

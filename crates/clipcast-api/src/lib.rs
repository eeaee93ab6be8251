//! Axum HTTP API server.
//!
//! This crate provides:
//! - REST routes for ingestion, review, and scheduling
//! - Per-company request scoping via the `X-Company-Id` header
//! - HTTP clients binding the provider traits to sidecar services
//! - Prometheus metrics

pub mod company;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod services;
pub mod state;

pub use company::CompanyId;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

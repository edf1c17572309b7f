//! Route table and middleware.
//!
//! CORS is fully permissive: the service is called directly from browser
//! front-ends on other origins.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::AppState;
use crate::config::ServerConfig;

/// Build the service router.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/api/parse-pdf", post(endpoints::parse_pdf::parse_pdf))
        .route("/health", get(endpoints::health::check))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

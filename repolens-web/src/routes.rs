//! Route definitions for the RepoLens web server

use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(handlers::openapi_json))
        // Packaging and snapshot lookup
        .route("/package", post(handlers::package_repository))
        .route("/repository/{id}", get(handlers::get_repository))
        // Analysis
        .route("/analyze", post(handlers::analyze_repository))
        .route("/analysis/{id}", get(handlers::get_analysis))
}

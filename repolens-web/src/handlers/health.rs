//! Health check and API document handlers

use super::types::{HealthResponse, StoreHealth};
use crate::{openapi::ApiDoc, AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use utoipa::OpenApi;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    summary = "Health check",
    description = "Server liveness plus store and cache status",
    responses(
        (status = 200, description = "Server and store are healthy", body = HealthResponse),
        (status = 503, description = "Store is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.application.store_status().await;
    let (status, code) = if store.healthy {
        ("healthy", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: StoreHealth::from(store),
            cache: state.cache.stats(),
        }),
    )
}

/// OpenAPI document for this server
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

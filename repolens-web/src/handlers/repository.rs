//! Packaging and repository lookup handlers

use super::types::{ErrorResponse, PackageRequest, PackageResponse, RepositoryResponse};
use crate::{AppState, WebError, WebResult};
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::StatusCode,
    response::Json,
};
use repolens_core::{RepolensError, SnapshotId};
use serde_json::Value;
use tracing::info;

/// Clone a repository and store a snapshot of it
#[utoipa::path(
    post,
    path = "/api/package",
    tag = "Repository",
    summary = "Package repository",
    description = "Clone the repository, record its files, commits and local branches, and store the result as a new snapshot. Packaging the same URL again creates another snapshot.",
    request_body = PackageRequest,
    responses(
        (status = 201, description = "Snapshot stored", body = PackageResponse),
        (status = 400, description = "repo_url is missing or empty", body = ErrorResponse),
        (status = 500, description = "Clone or traversal failed", body = ErrorResponse)
    )
)]
pub async fn package_repository(
    State(state): State<AppState>,
    payload: Result<Json<PackageRequest>, JsonRejection>,
) -> WebResult<(StatusCode, Json<PackageResponse>)> {
    let repo_url = payload
        .ok()
        .and_then(|Json(request)| request.repo_url)
        .ok_or_else(|| WebError::BadRequest("Missing repo_url".to_string()))?;

    info!(repo_url = %repo_url, "📦 Packaging repository");
    let repo_id = state.application.package(&repo_url).await?;

    Ok((StatusCode::CREATED, Json(PackageResponse { repo_id })))
}

/// Snapshot metadata by id
#[utoipa::path(
    get,
    path = "/api/repository/{id}",
    tag = "Repository",
    summary = "Get repository",
    params(
        ("id" = String, Path, description = "Snapshot id returned by /api/package")
    ),
    responses(
        (status = 200, description = "Snapshot metadata", body = RepositoryResponse),
        (status = 404, description = "Unknown or non-numeric id", body = ErrorResponse)
    )
)]
pub async fn get_repository(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> WebResult<Json<Value>> {
    if let Some(cached) = state.cache.get(uri.path()) {
        return Ok(Json(cached));
    }

    let not_found = || WebError::NotFound("Repository not found".to_string());
    let id: SnapshotId = id.parse().map_err(|_| not_found())?;
    let snapshot = state
        .application
        .get_snapshot(id)
        .await?
        .ok_or_else(not_found)?;

    let body = serde_json::to_value(RepositoryResponse::from(&snapshot))
        .map_err(RepolensError::from)?;
    state.cache.insert(uri.path(), body.clone());

    Ok(Json(body))
}

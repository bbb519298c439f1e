//! Analysis handlers

use super::types::{AnalysisResponse, AnalyzeRequest, AnalyzeResponse, ErrorResponse};
use crate::{AppState, WebError, WebResult};
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::StatusCode,
    response::Json,
};
use repolens_core::{AnalysisId, RepolensError};
use serde_json::Value;
use tracing::info;

/// Compute and store one analysis of a snapshot
#[utoipa::path(
    post,
    path = "/api/analyze",
    tag = "Analysis",
    summary = "Analyze repository",
    description = "Run an analysis kind over a stored snapshot. Unknown snapshot ids and unknown kinds are rejected without storing anything.",
    request_body = AnalyzeRequest,
    responses(
        (status = 201, description = "Analysis stored", body = AnalyzeResponse),
        (status = 400, description = "Missing field, unknown repo_id or unknown analysis_type", body = ErrorResponse)
    )
)]
pub async fn analyze_repository(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> WebResult<(StatusCode, Json<AnalyzeResponse>)> {
    let (repo_id, analysis_type) = match payload {
        Ok(Json(AnalyzeRequest {
            repo_id: Some(repo_id),
            analysis_type: Some(analysis_type),
        })) => (repo_id, analysis_type),
        _ => {
            return Err(WebError::BadRequest(
                "Missing repo_id or analysis_type".to_string(),
            ))
        }
    };

    info!(repo_id, kind = %analysis_type, "📊 Analyzing repository");
    match state.application.analyze(repo_id, &analysis_type).await {
        Ok(analysis_id) => Ok((StatusCode::CREATED, Json(AnalyzeResponse { analysis_id }))),
        Err(e @ (RepolensError::InvalidRequest { .. } | RepolensError::NotFound { .. })) => {
            e.log();
            Err(WebError::BadRequest(
                "Invalid repo_id or analysis_type".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// Stored analysis by id
#[utoipa::path(
    get,
    path = "/api/analysis/{id}",
    tag = "Analysis",
    summary = "Get analysis",
    params(
        ("id" = String, Path, description = "Analysis id returned by /api/analyze")
    ),
    responses(
        (status = 200, description = "Analysis result", body = AnalysisResponse),
        (status = 404, description = "Unknown or non-numeric id", body = ErrorResponse)
    )
)]
pub async fn get_analysis(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> WebResult<Json<Value>> {
    if let Some(cached) = state.cache.get(uri.path()) {
        return Ok(Json(cached));
    }

    let not_found = || WebError::NotFound("Analysis not found".to_string());
    let id: AnalysisId = id.parse().map_err(|_| not_found())?;
    let details = state
        .application
        .get_analysis_details(id)
        .await?
        .ok_or_else(not_found)?;

    let body =
        serde_json::to_value(AnalysisResponse::from(details)).map_err(RepolensError::from)?;
    state.cache.insert(uri.path(), body.clone());

    Ok(Json(body))
}

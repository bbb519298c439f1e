//! Analysis request and lookup types

use chrono::{DateTime, Utc};
use repolens_applications::AnalysisDetails;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to run one analysis kind over a stored snapshot
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    #[schema(example = 1)]
    pub repo_id: Option<i64>,
    /// One of `file_count`, `file_types`, `commit_count`, `branch_count`, `summary`
    #[schema(example = "file_types")]
    pub analysis_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    #[schema(example = 1)]
    pub analysis_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 1)]
    pub repository_id: i64,
    #[schema(example = "log")]
    pub repository_name: String,
    #[schema(example = "file_types")]
    pub analysis_type: String,
    #[schema(value_type = Object)]
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisDetails> for AnalysisResponse {
    fn from(details: AnalysisDetails) -> Self {
        let AnalysisDetails {
            analysis,
            repository_name,
        } = details;

        Self {
            id: analysis.id,
            repository_id: analysis.snapshot_id,
            repository_name,
            analysis_type: analysis.kind,
            result: analysis.result,
            created_at: analysis.created_at,
        }
    }
}

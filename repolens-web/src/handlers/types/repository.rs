//! Packaging and repository lookup types

use chrono::{DateTime, Utc};
use repolens_core::Snapshot;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to clone and package a repository
#[derive(Debug, Deserialize, ToSchema)]
pub struct PackageRequest {
    /// Anything `git clone` accepts
    #[schema(example = "https://github.com/rust-lang/log.git")]
    pub repo_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackageResponse {
    #[schema(example = 1)]
    pub repo_id: i64,
}

/// Snapshot metadata, without the packaged payload
#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoryResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "log")]
    pub name: String,
    #[schema(example = "https://github.com/rust-lang/log.git")]
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Snapshot> for RepositoryResponse {
    fn from(snapshot: &Snapshot) -> Self {
        let summary = snapshot.summary();
        Self {
            id: summary.id,
            name: summary.name,
            url: summary.url,
            created_at: summary.created_at,
        }
    }
}

//! Types shared across handlers

use crate::cache::CacheStats;
use repolens_applications::StoreStatus;
use serde::Serialize;
use utoipa::ToSchema;

/// Body of every failed request
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Repository not found")]
    pub error: String,
}

/// Store health as seen by the web server
#[derive(Debug, Serialize, ToSchema)]
pub struct StoreHealth {
    #[schema(example = "sqlite")]
    pub backend: String,
    pub healthy: bool,
    pub snapshots: u64,
    pub analyses: u64,
}

impl From<StoreStatus> for StoreHealth {
    fn from(status: StoreStatus) -> Self {
        Self {
            backend: status.backend.to_string(),
            healthy: status.healthy,
            snapshots: status.snapshots,
            analyses: status.analyses,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
    pub store: StoreHealth,
    pub cache: CacheStats,
}

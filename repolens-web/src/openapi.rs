//! OpenAPI document for the RepoLens HTTP API

use crate::cache::CacheStats;
use crate::handlers::{
    AnalysisResponse, AnalyzeRequest, AnalyzeResponse, ErrorResponse, HealthResponse,
    PackageRequest, PackageResponse, RepositoryResponse, StoreHealth,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RepoLens Web API",
        description = "Package git repositories into stored snapshots and compute analyses over them",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,
        crate::handlers::package_repository,
        crate::handlers::get_repository,
        crate::handlers::analyze_repository,
        crate::handlers::get_analysis,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            StoreHealth,
            CacheStats,
            PackageRequest,
            PackageResponse,
            RepositoryResponse,
            AnalyzeRequest,
            AnalyzeResponse,
            AnalysisResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Repository", description = "Packaging and snapshot lookup"),
        (name = "Analysis", description = "Analysis computation and lookup"),
    )
)]
pub struct ApiDoc;

/// Get the OpenAPI document as pretty-printed JSON
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

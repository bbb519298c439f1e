//! RepoLens Web Server
//!
//! HTTP interface for packaging repositories into snapshots and analyzing them.

pub mod cache;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use cache::ResponseCache;
pub use server::{RepolensServer, RepolensServerBuilder};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    Router,
};
use handlers::ErrorResponse;
use repolens_core::{LogFormat, LoggingConfig, RepolensError};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(state.config.dev_mode);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

/// Any origin in development mode, otherwise local front-end dev servers only
fn cors_layer(dev_mode: bool) -> CorsLayer {
    if dev_mode {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ]))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([ACCEPT, CONTENT_TYPE])
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable development mode
    pub dev_mode: bool,
    /// Store location; in-memory SQLite when unset
    pub database_url: Option<String>,
    /// RepoLens TOML configuration (fetch, walk and cache sections)
    pub config_path: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            database_url: None,
            config_path: None,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("REPOLENS_HOST").unwrap_or(defaults.host),
            port: std::env::var("REPOLENS_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
            dev_mode: std::env::var("REPOLENS_DEV_MODE")
                .ok()
                .and_then(|flag| flag.parse().ok())
                .unwrap_or(defaults.dev_mode),
            database_url: std::env::var("DATABASE_URL").ok(),
            config_path: std::env::var("REPOLENS_CONFIG").ok(),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error(transparent)]
    Application(#[from] RepolensError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::Application(e) => StatusCode::from_u16(e.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Server(_) | WebError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            WebError::Application(e) => e.log(),
            other => debug!(status = %status, error = %other, "Request rejected"),
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Initialize logging for the web server
///
/// `RUST_LOG` still takes precedence over `level`.
pub fn init_logging(level: &str, json: bool) -> WebResult<()> {
    let config = LoggingConfig {
        level: level.to_string(),
        format: if json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
        include_location: false,
        filter_directives: vec![
            format!("repolens_web={}", level),
            format!("repolens_applications={}", level),
            format!("tower_http={}", level),
        ],
        ..LoggingConfig::default()
    };

    repolens_core::init_logging(&config).map_err(|e| WebError::Config(e.to_string()))
}

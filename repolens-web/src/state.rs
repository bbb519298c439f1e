//! Shared application state

use crate::{ResponseCache, WebConfig, WebResult};
use repolens_applications::RepolensApplication;
use repolens_core::RepolensConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Store used when neither `--database-url` nor `DATABASE_URL` is given
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Main RepoLens application service
    pub application: Arc<RepolensApplication>,
    /// Cache for repository and analysis lookups
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    /// Load the RepoLens configuration, open the store and build the service
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let mut settings = match &config.config_path {
            Some(path) => {
                info!(path = %path, "📄 Loading RepoLens configuration");
                RepolensConfig::from_file(path)?
            }
            None => RepolensConfig::default(),
        };
        settings.storage.database_url = config
            .database_url
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let cache = ResponseCache::new(
            settings.cache.max_entries,
            Duration::from_secs(settings.cache.ttl_secs),
        );
        let application = RepolensApplication::new(settings).await?;

        Ok(Self::from_parts(config, application, cache))
    }

    /// Assemble state around an already built application
    pub fn from_parts(
        config: WebConfig,
        application: RepolensApplication,
        cache: ResponseCache,
    ) -> Self {
        Self {
            config,
            application: Arc::new(application),
            cache: Arc::new(cache),
        }
    }
}

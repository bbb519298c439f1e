//! RepoLens Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main RepoLens web server
pub struct RepolensServer {
    config: WebConfig,
    state: AppState,
}

impl RepolensServer {
    /// Create a new RepoLens server
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.clone(),
            state,
        }
    }

    /// Bind the configured address and serve until the process stops
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("🚀 Starting RepoLens Web Server");
        info!("🔧 Development mode: {}", self.config.dev_mode);

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        self.run(listener).await
    }

    /// Serve on an already bound listener
    pub async fn run(self, listener: TcpListener) -> WebResult<()> {
        let app = create_app(self.state.clone());

        if let Ok(address) = listener.local_addr() {
            info!("✅ Server listening on http://{}", address);
        }

        // Purge expired cache entries once per TTL period
        let cache = self.state.cache.clone();
        let period = cache.ttl().max(std::time::Duration::from_secs(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                cache.purge_expired();
            }
        });

        if let Err(e) = serve(listener, app).await {
            error!("❌ Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for RepolensServer
pub struct RepolensServerBuilder {
    config: WebConfig,
}

impl RepolensServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: WebConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database_url = Some(database_url.into());
        self
    }

    /// Set the RepoLens configuration file
    pub fn config_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.config_path = Some(path.into());
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<RepolensServer> {
        RepolensServer::new(self.config).await
    }
}

impl Default for RepolensServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

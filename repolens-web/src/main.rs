//! RepoLens Web Server

use clap::Parser;
use repolens_web::server::RepolensServerBuilder;
use repolens_web::{init_logging, WebConfig};
use tracing::{error, info};

/// RepoLens Web Server - package git repositories and analyze the snapshots
#[derive(Parser)]
#[command(name = "repolens-web")]
#[command(about = "HTTP interface for RepoLens")]
#[command(version)]
struct Args {
    /// Server host to bind to [env: REPOLENS_HOST, default: 127.0.0.1]
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on [env: REPOLENS_PORT, default: 8080]
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Store location, `sqlite:<path>`, `sqlite::memory:` or `memory` [env: DATABASE_URL]
    #[arg(long)]
    database_url: Option<String>,

    /// RepoLens TOML configuration file [env: REPOLENS_CONFIG]
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Command line values win over the environment
    fn apply(self, mut config: WebConfig) -> WebConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config.dev_mode |= self.dev;
        if self.database_url.is_some() {
            config.database_url = self.database_url;
        }
        if self.config.is_some() {
            config.config_path = self.config;
        }
        config
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging(&args.log_level, args.json_logs) {
        eprintln!("❌ Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = args.apply(WebConfig::from_env());

    info!("📍 Server: http://{}", config.address());
    if let Some(db_url) = &config.database_url {
        info!("🗄️  Database: {}", db_url);
    }

    let server = match RepolensServerBuilder::from_config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            error!("❌ Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        error!("❌ Server failed: {}", e);
        std::process::exit(1);
    }
}

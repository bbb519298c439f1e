//! RepoLens CLI - package repositories into snapshots and analyze them

use clap::{Parser, Subcommand};
use repolens_applications::RepolensApplication;
use repolens_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success,
    not_found_error, performance::measure_async, AnalysisId, ErrorContext, LoggingConfig,
    RepolensConfig, RepolensError, RepolensResult, SnapshotId,
};
use repolens_repo::AnalyzerRegistry;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "repolens")]
#[command(about = "Package git repositories into snapshots and compute analyses over them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override storage.database_url
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a repository and store a snapshot of it
    Package {
        /// Repository URL or local path
        repo_url: String,

        /// Also run these analysis kinds on the new snapshot
        #[arg(short, long = "analyze", value_name = "KIND")]
        analyses: Vec<String>,
    },

    /// Run an analysis kind over a stored snapshot
    Analyze {
        /// Snapshot id printed by `package`
        repo_id: SnapshotId,

        /// Analysis kind, see `kinds`
        analysis_type: String,
    },

    /// Print a stored record
    Show {
        #[command(subcommand)]
        target: ShowTarget,
    },

    /// List the available analysis kinds
    Kinds,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Snapshot metadata
    Repository {
        id: SnapshotId,

        /// Include files, commits and branches
        #[arg(long)]
        payload: bool,
    },
    /// An analysis and its result
    Analysis { id: AnalysisId },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ {}", e);
        if let Some(context) = e.context() {
            for suggestion in &context.recovery_suggestions {
                eprintln!("   💡 {}", suggestion);
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> RepolensResult<()> {
    init_logging(&LoggingConfig::cli(cli.verbose)).map_err(|e| RepolensError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the RUST_LOG environment variable"),
    })?;

    info!("Starting RepoLens CLI v{}", env!("CARGO_PKG_VERSION"));

    let application = match cli.command {
        Commands::Config {
            show,
            init,
            force,
            validate,
        } => return handle_config(cli.config.as_deref(), show, init, force, validate),
        Commands::Kinds => return handle_kinds(),
        _ => {
            let (mut config, _) = load_config(cli.config.as_deref())?;
            if let Some(database_url) = cli.database_url {
                config.storage.database_url = database_url;
            }
            RepolensApplication::new(config).await?
        }
    };

    match cli.command {
        Commands::Package { repo_url, analyses } => {
            handle_package(&application, &repo_url, &analyses).await
        }
        Commands::Analyze {
            repo_id,
            analysis_type,
        } => handle_analyze(&application, repo_id, &analysis_type).await,
        Commands::Show { target } => handle_show(&application, target).await,
        Commands::Config { .. } | Commands::Kinds => Ok(()),
    }
}

/// Explicit path, then the default locations, then built-in defaults
fn load_config(config_path: Option<&Path>) -> RepolensResult<(RepolensConfig, Option<PathBuf>)> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return Ok((RepolensConfig::from_file(path)?, Some(path.to_path_buf())));
    }

    for path in RepolensConfig::default_paths() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            let config = RepolensConfig::from_file(&path)?;
            return Ok((config, Some(path)));
        }
    }

    info!("No configuration file found, using defaults");
    Ok((RepolensConfig::default(), None))
}

async fn handle_package(
    application: &RepolensApplication,
    repo_url: &str,
    analyses: &[String],
) -> RepolensResult<()> {
    log_operation_start!("package", repo_url = %repo_url);

    let snapshot_id = measure_async("package", application.package(repo_url))
        .await
        .map_err(|e| {
            log_operation_error!("package", e, repo_url = %repo_url);
            e
        })?;
    println!("📦 Snapshot {} stored", snapshot_id);

    for kind in analyses {
        let analysis_id = application.analyze(snapshot_id, kind).await?;
        println!("📊 Analysis {} ({})", analysis_id, kind);
    }

    log_operation_success!("package", snapshot_id = snapshot_id, analyses = analyses.len());
    Ok(())
}

async fn handle_analyze(
    application: &RepolensApplication,
    repo_id: SnapshotId,
    analysis_type: &str,
) -> RepolensResult<()> {
    log_operation_start!("analyze", repo_id = repo_id, kind = %analysis_type);

    let analysis_id = application
        .analyze(repo_id, analysis_type)
        .await
        .map_err(|e| {
            log_operation_error!("analyze", e, repo_id = repo_id);
            e
        })?;

    let analysis = application
        .get_analysis(analysis_id)
        .await?
        .ok_or_else(|| not_found_error!(format!("analysis {}", analysis_id), "cli"))?;

    println!("📊 Analysis {} stored", analysis_id);
    print_json(&analysis.result)?;

    log_operation_success!("analyze", analysis_id = analysis_id);
    Ok(())
}

async fn handle_show(application: &RepolensApplication, target: ShowTarget) -> RepolensResult<()> {
    let value = match target {
        ShowTarget::Repository { id, payload } => {
            let snapshot = application
                .get_snapshot(id)
                .await?
                .ok_or_else(|| not_found_error!(format!("repository {}", id), "cli"))?;
            if payload {
                serde_json::to_value(&snapshot)?
            } else {
                serde_json::to_value(snapshot.summary())?
            }
        }
        ShowTarget::Analysis { id } => {
            let details = application
                .get_analysis_details(id)
                .await?
                .ok_or_else(|| not_found_error!(format!("analysis {}", id), "cli"))?;
            serde_json::to_value(&details)?
        }
    };

    print_json(&value)
}

fn handle_kinds() -> RepolensResult<()> {
    let registry = AnalyzerRegistry::default();
    for kind in registry.kinds() {
        println!("{:<14} {}", kind.name(), kind.description());
    }
    Ok(())
}

fn handle_config(
    config_path: Option<&Path>,
    show: bool,
    init: bool,
    force: bool,
    validate: bool,
) -> RepolensResult<()> {
    if !(show || init || validate) {
        println!("Nothing to do; pass --init, --show or --validate");
        return Ok(());
    }

    if init {
        let target = match config_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };
        init_config_file(&target, force)?;
        println!("✅ Configuration initialized at: {}", target.display());
    }

    if show || validate {
        let (config, source) = load_config(config_path)?;

        if show {
            match &source {
                Some(path) => println!("📋 Configuration from {}:", path.display()),
                None => println!("📋 Default configuration:"),
            }
            let rendered = toml::to_string_pretty(&config).map_err(|e| RepolensError::Config {
                message: format!("Failed to serialize config: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("cli").with_operation("show_config"),
            })?;
            println!("{}", rendered);
        }

        if validate {
            config.validate()?;
            println!("✅ Configuration is valid");
        }
    }

    Ok(())
}

/// Where `config --init` writes when no path is given
fn default_config_path() -> RepolensResult<PathBuf> {
    RepolensConfig::default_paths()
        .into_iter()
        .next()
        .ok_or_else(|| RepolensError::Config {
            message: "No configuration directory available".to_string(),
            source: None,
            context: ErrorContext::new("cli")
                .with_operation("init_config")
                .with_suggestion("Pass --config <path>"),
        })
}

fn init_config_file(target: &Path, force: bool) -> RepolensResult<()> {
    if target.exists() && !force {
        return Err(RepolensError::Config {
            message: format!("{} already exists", target.display()),
            source: None,
            context: ErrorContext::new("cli")
                .with_operation("init_config")
                .with_suggestion("Pass --force to overwrite it"),
        });
    }

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    RepolensConfig::default().save_to_file(target)
}

fn print_json(value: &Value) -> RepolensResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Configuration management

use crate::error::{ErrorContext, RepolensError, RepolensResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepolensConfig {
    pub fetch: FetchConfig,
    pub walk: WalkConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
}

/// How sources are cloned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Git executable used for cloning
    pub git_binary: String,
    /// Shallow clone depth (None = full history)
    pub clone_depth: Option<u32>,
    /// Abort the clone after this many seconds (None = no limit)
    pub clone_timeout_secs: Option<u64>,
    /// Attempts per clone; failures are retried with backoff
    pub clone_attempts: usize,
    /// Parent directory for temporary working directories (None = system temp dir)
    pub work_dir: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            git_binary: "git".to_string(),
            clone_depth: None,
            clone_timeout_secs: None,
            clone_attempts: 1,
            work_dir: None,
        }
    }
}

/// How a working tree is traversed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Include the clone's top-level `.git` directory in the file list
    pub include_vcs_metadata: bool,
    /// Glob patterns for files to leave out
    pub exclude_patterns: Vec<String>,
    /// Record a line count for every file
    pub count_lines: bool,
    /// Honour `.gitignore` rules found in the working tree
    pub respect_gitignore: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            include_vcs_metadata: false,
            exclude_patterns: Vec::new(),
            count_lines: true,
            respect_gitignore: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `sqlite:<path>`, `sqlite::memory:` or `memory`
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:~/.repolens/repolens.db".to_string(),
        }
    }
}

impl StorageConfig {
    /// Database URL with a leading `~` expanded to the home directory
    pub fn resolved_database_url(&self) -> String {
        match self.database_url.strip_prefix("sqlite:~") {
            Some(rest) => match dirs::home_dir() {
                Some(home) => format!("sqlite:{}{}", home.display(), rest),
                None => self.database_url.clone(),
            },
            None => self.database_url.clone(),
        }
    }
}

/// Response cache used by the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            ttl_secs: 300,
        }
    }
}

impl RepolensConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RepolensResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RepolensError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: RepolensConfig = toml::from_str(&content).map_err(|e| RepolensError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> RepolensResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RepolensError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| RepolensError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> RepolensResult<()> {
        if self.fetch.git_binary.trim().is_empty() {
            return Err(RepolensError::Config {
                message: "fetch.git_binary must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set fetch.git_binary to \"git\" or a full path"),
            });
        }

        if self.fetch.clone_depth == Some(0) {
            return Err(RepolensError::Config {
                message: "fetch.clone_depth must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Remove fetch.clone_depth to clone the full history"),
            });
        }

        if self.fetch.clone_timeout_secs == Some(0) {
            return Err(RepolensError::Config {
                message: "fetch.clone_timeout_secs must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Remove fetch.clone_timeout_secs to disable the limit"),
            });
        }

        if self.fetch.clone_attempts == 0 {
            return Err(RepolensError::Config {
                message: "fetch.clone_attempts must be at least 1".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        for pattern in &self.walk.exclude_patterns {
            if pattern.trim().is_empty() {
                return Err(RepolensError::Config {
                    message: "walk.exclude_patterns must not contain empty patterns".to_string(),
                    source: None,
                    context: ErrorContext::new("config").with_operation("validate"),
                });
            }
        }

        if self.storage.database_url.trim().is_empty() {
            return Err(RepolensError::Config {
                message: "storage.database_url must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use \"sqlite::memory:\" for a throwaway store"),
            });
        }

        if self.cache.max_entries == 0 {
            return Err(RepolensError::Config {
                message: "cache.max_entries must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set cache.max_entries to a positive value"),
            });
        }

        Ok(())
    }

    /// Default config file locations, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|d| d.join("repolens").join("config.toml")),
            dirs::home_dir().map(|d| d.join(".repolens").join("config.toml")),
            Some(PathBuf::from("repolens.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

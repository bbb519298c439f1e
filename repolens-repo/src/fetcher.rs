//! Source fetcher
//!
//! Clones a repository with the system `git` binary into a private temporary
//! directory. The directory lives exactly as long as the returned
//! [`ClonedRepository`].

use futures::FutureExt;
use repolens_core::{
    retry_async, with_timeout, ErrorContext, FetchConfig, RepolensError, RepolensResult,
    RetryConfig,
};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

const CHECKOUT_DIR: &str = "checkout";

/// A clone held in a scoped temporary directory, removed on drop
#[derive(Debug)]
pub struct ClonedRepository {
    workdir: TempDir,
    path: PathBuf,
}

impl ClonedRepository {
    /// Root of the working tree
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the working directory now, reporting failures
    pub fn close(self) -> RepolensResult<()> {
        let location = self.workdir.path().display().to_string();
        self.workdir.close()?;
        debug!(workdir = %location, "Working directory removed");
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    config: FetchConfig,
}

impl SourceFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Clone `url` into a fresh working directory
    pub async fn fetch(&self, url: &str) -> RepolensResult<ClonedRepository> {
        if self.config.clone_attempts <= 1 {
            return clone_repository(&self.config, url).await;
        }

        let retry = RetryConfig {
            max_attempts: self.config.clone_attempts,
            ..RetryConfig::default()
        };
        let config = self.config.clone();
        let url = url.to_string();

        retry_async(
            move || {
                let config = config.clone();
                let url = url.clone();
                async move { clone_repository(&config, &url).await }.boxed()
            },
            retry,
            "git_clone",
        )
        .await
    }
}

async fn clone_repository(config: &FetchConfig, url: &str) -> RepolensResult<ClonedRepository> {
    let workdir = create_workdir(config).await?;
    let target = workdir.path().join(CHECKOUT_DIR);

    info!(
        repo_url = %url,
        target_path = %target.display(),
        "🚀 Starting repository clone"
    );

    let mut cmd = Command::new(&config.git_binary);
    cmd.arg("clone");

    if let Some(depth) = config.clone_depth {
        cmd.arg("--depth").arg(depth.to_string());
    }

    cmd.arg("--")
        .arg(url)
        .arg(&target)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = match config.clone_timeout_secs {
        Some(secs) => with_timeout(cmd.output(), secs.saturating_mul(1000), "git_clone")
            .await
            .map_err(|e| RepolensError::CloneFailed {
                message: format!("git clone of {} did not finish within {}s", url, secs),
                source: Some(Box::new(e)),
                context: ErrorContext::new("source_fetcher")
                    .with_operation("clone_repository")
                    .with_metadata("repo_url", url)
                    .with_suggestion("Raise fetch.clone_timeout_secs or set fetch.clone_depth"),
            })?,
        None => cmd.output().await,
    };

    let output = output.map_err(|e| RepolensError::CloneFailed {
        message: format!("Failed to execute {}: {}", config.git_binary, e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("source_fetcher")
            .with_operation("clone_repository")
            .with_suggestion("Ensure git is installed and accessible"),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RepolensError::CloneFailed {
            message: format!("git clone failed: {}", stderr.trim()),
            source: None,
            context: ErrorContext::new("source_fetcher")
                .with_operation("clone_repository")
                .with_metadata("repo_url", url)
                .with_metadata("exit_status", &output.status.to_string())
                .with_suggestion("Check repository URL and access permissions"),
        });
    }

    info!(
        repo_url = %url,
        target_path = %target.display(),
        "✅ Repository cloned successfully"
    );

    Ok(ClonedRepository {
        workdir,
        path: target,
    })
}

async fn create_workdir(config: &FetchConfig) -> RepolensResult<TempDir> {
    let parent = match &config.work_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| workdir_error(dir, e))?;
            PathBuf::from(dir)
        }
        None => std::env::temp_dir(),
    };

    tempfile::Builder::new()
        .prefix("repolens-")
        .tempdir_in(&parent)
        .map_err(|e| workdir_error(&parent.display().to_string(), e))
}

fn workdir_error(dir: &str, error: std::io::Error) -> RepolensError {
    RepolensError::CloneFailed {
        message: format!("Failed to create working directory in {}: {}", dir, error),
        source: Some(Box::new(error)),
        context: ErrorContext::new("source_fetcher")
            .with_operation("create_workdir")
            .with_suggestion("Check fetch.work_dir exists and is writable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_git_binary_is_clone_failure() {
        let fetcher = SourceFetcher::new(FetchConfig {
            git_binary: "definitely-not-a-git-binary".to_string(),
            ..FetchConfig::default()
        });

        let err = fetcher.fetch("https://example.invalid/repo.git").await.unwrap_err();
        match err {
            RepolensError::CloneFailed { message, .. } => {
                assert!(message.contains("definitely-not-a-git-binary"));
            }
            other => panic!("expected CloneFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_clone_leaves_no_workdir() {
        let parent = tempfile::tempdir().unwrap();
        let fetcher = SourceFetcher::new(FetchConfig {
            work_dir: Some(parent.path().display().to_string()),
            ..FetchConfig::default()
        });

        let missing = parent.path().join("no-such-repo");
        let err = fetcher
            .fetch(&missing.display().to_string())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "clone_failed");

        let leftovers: Vec<_> = std::fs::read_dir(parent.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("repolens-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_huge_clone_timeout_does_not_overflow() {
        let parent = tempfile::tempdir().unwrap();
        let config = repolens_core::RepolensConfig {
            fetch: FetchConfig {
                clone_timeout_secs: Some(u64::MAX / 10),
                ..FetchConfig::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let missing = parent.path().join("no-such-repo");
        let err = SourceFetcher::new(config.fetch)
            .fetch(&missing.display().to_string())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "clone_failed");
    }

    #[cfg(unix)]
    fn stub_git(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("stub-git");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_clone_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let finished = dir.path().join("finished");
        let fetcher = SourceFetcher::new(FetchConfig {
            git_binary: stub_git(
                dir.path(),
                &format!("sleep 3\ntouch '{}'", finished.display()),
            ),
            clone_timeout_secs: Some(1),
            work_dir: Some(dir.path().display().to_string()),
            ..FetchConfig::default()
        });

        let started = std::time::Instant::now();
        let err = fetcher.fetch("https://example.invalid/repo.git").await.unwrap_err();
        assert!(started.elapsed() < std::time::Duration::from_secs(3));
        match err {
            RepolensError::CloneFailed { message, .. } => {
                assert!(message.contains("did not finish within 1s"), "{message}");
            }
            other => panic!("expected CloneFailed, got {other:?}"),
        }

        // The clone process was killed before it could finish
        tokio::time::sleep(std::time::Duration::from_secs(4)).await;
        assert!(!finished.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_clone_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let calls = dir.path().join("calls");
        let fetcher = SourceFetcher::new(FetchConfig {
            git_binary: stub_git(
                dir.path(),
                &format!("echo clone >> '{}'\nexit 1", calls.display()),
            ),
            clone_attempts: 2,
            work_dir: Some(dir.path().display().to_string()),
            ..FetchConfig::default()
        });

        let err = fetcher.fetch("https://example.invalid/repo.git").await.unwrap_err();
        assert_eq!(err.category(), "clone_failed");
        assert_eq!(std::fs::read_to_string(&calls).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_retried_clone_of_missing_path_fails() {
        let parent = tempfile::tempdir().unwrap();
        let fetcher = SourceFetcher::new(FetchConfig {
            clone_attempts: 2,
            ..FetchConfig::default()
        });

        let missing = parent.path().join("no-such-repo");
        let err = fetcher
            .fetch(&missing.display().to_string())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "clone_failed");
    }
}

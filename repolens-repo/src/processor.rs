//! Repository processor
//!
//! Fetch and walk in one step: clones a source URL, reads the working tree
//! and history into a [`NewSnapshot`], then discards the clone.

use crate::fetcher::SourceFetcher;
use crate::walker::{RepositoryWalker, WalkOptions};
use repolens_core::{
    ErrorContext, FetchConfig, NewSnapshot, RepolensConfig, RepolensError, RepolensResult,
    WalkConfig,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RepositoryProcessor {
    fetcher: SourceFetcher,
    walker: Arc<RepositoryWalker>,
}

impl RepositoryProcessor {
    pub fn new(fetch: FetchConfig, walk: &WalkConfig) -> RepolensResult<Self> {
        Ok(Self {
            fetcher: SourceFetcher::new(fetch),
            walker: Arc::new(RepositoryWalker::new(WalkOptions::from_config(walk)?)),
        })
    }

    pub fn from_config(config: &RepolensConfig) -> RepolensResult<Self> {
        Self::new(config.fetch.clone(), &config.walk)
    }

    pub fn fetcher(&self) -> &SourceFetcher {
        &self.fetcher
    }

    pub fn walker(&self) -> &RepositoryWalker {
        &self.walker
    }

    /// Clone `url` and capture it as an unsaved snapshot
    ///
    /// The temporary clone is removed before this returns, whether the walk
    /// succeeded or not.
    pub async fn package(&self, url: &str) -> RepolensResult<NewSnapshot> {
        let clone = self.fetcher.fetch(url).await?;
        let walker = Arc::clone(&self.walker);

        let payload = tokio::task::spawn_blocking(move || {
            let payload = walker.walk(clone.path());
            if let Err(e) = clone.close() {
                debug!(error = %e, "Could not remove working directory");
            }
            payload
        })
        .await
        .map_err(|e| RepolensError::Internal {
            message: format!("Walker task failed: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("repository_processor").with_operation("package"),
        })??;

        let name = repository_name(url);
        info!(
            repo_url = %url,
            name = %name,
            files = payload.files.len(),
            commits = payload.commits.len(),
            "✅ Repository packaged"
        );

        Ok(NewSnapshot {
            name,
            url: url.to_string(),
            payload,
        })
    }
}

/// Display name for a source URL: the final path segment without `.git`
///
/// Handles `https://host/owner/repo.git`, `git@host:owner/repo.git`, bare
/// `host:repo` and local paths. Falls back to `unknown`.
pub fn repository_name(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(|c| c == '/' || c == ':' || c == '\\')
        .next()
        .unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() {
        "unknown".to_string()
    } else {
        name.to_string()
    }
}

//! The RepoLens service: package, analyze and look up records

use crate::store::{open_store, SnapshotStore};
use repolens_core::{
    invalid_request, not_found_error, Analysis, AnalysisId, NewAnalysis, RepolensConfig,
    RepolensResult, Snapshot, SnapshotId,
};
use repolens_repo::{AnalysisKind, AnalyzerRegistry, RepositoryProcessor};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// An analysis together with the name of the repository it was computed from
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisDetails {
    pub analysis: Analysis,
    pub repository_name: String,
}

/// Store health as reported by `/health` and the CLI
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub backend: &'static str,
    pub healthy: bool,
    pub snapshots: u64,
    pub analyses: u64,
}

/// Main RepoLens application service
pub struct RepolensApplication {
    processor: RepositoryProcessor,
    registry: AnalyzerRegistry,
    store: Arc<dyn SnapshotStore>,
}

/// Builder for RepolensApplication
pub struct RepolensApplicationBuilder {
    config: RepolensConfig,
    store: Option<Arc<dyn SnapshotStore>>,
    registry: AnalyzerRegistry,
}

impl RepolensApplicationBuilder {
    pub fn new(config: RepolensConfig) -> Self {
        Self {
            config,
            store: None,
            registry: AnalyzerRegistry::default(),
        }
    }

    /// Use an already opened store instead of `storage.database_url`
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register an additional analysis kind
    pub fn with_analysis_kind<K: AnalysisKind + 'static>(mut self, kind: K) -> Self {
        self.registry.register(kind);
        self
    }

    pub async fn build(self) -> RepolensResult<RepolensApplication> {
        self.config.validate()?;

        let processor = RepositoryProcessor::from_config(&self.config)?;

        let store = match self.store {
            Some(store) => store,
            None => open_store(&self.config.storage.resolved_database_url()).await?,
        };

        info!(
            backend = store.backend(),
            kinds = self.registry.kinds().len(),
            "🚀 RepoLens application ready"
        );

        Ok(RepolensApplication {
            processor,
            registry: self.registry,
            store,
        })
    }
}

impl RepolensApplication {
    pub async fn new(config: RepolensConfig) -> RepolensResult<Self> {
        RepolensApplicationBuilder::new(config).build().await
    }

    pub fn builder(config: RepolensConfig) -> RepolensApplicationBuilder {
        RepolensApplicationBuilder::new(config)
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    /// Clone `url`, capture its files, history and branches, and persist the
    /// result as a new snapshot
    ///
    /// Every call produces a new snapshot, even for a URL packaged before.
    #[instrument(skip(self))]
    pub async fn package(&self, url: &str) -> RepolensResult<SnapshotId> {
        let url = url.trim();
        if url.is_empty() {
            return Err(invalid_request!(
                "Repository URL must not be empty",
                "repo_url",
                "application"
            ));
        }

        let snapshot = self.processor.package(url).await?;
        let id = self.store.put_snapshot(snapshot).await?;

        info!(snapshot_id = id, repo_url = %url, "📦 Snapshot stored");
        Ok(id)
    }

    /// Compute `kind` over a stored snapshot and persist the result
    #[instrument(skip(self))]
    pub async fn analyze(&self, snapshot_id: SnapshotId, kind: &str) -> RepolensResult<AnalysisId> {
        if !self.registry.contains(kind) {
            warn!(kind = %kind, "Rejected unknown analysis type");
            return Err(invalid_request!(
                format!("Unknown analysis type: {}", kind),
                "analysis_type",
                "application"
            ));
        }

        let snapshot = self
            .store
            .get_snapshot(snapshot_id)
            .await?
            .ok_or_else(|| not_found_error!(format!("snapshot {}", snapshot_id), "application"))?;

        let result = self.registry.compute(kind, &snapshot.payload)?;
        let id = self
            .store
            .put_analysis(NewAnalysis {
                snapshot_id,
                kind: kind.to_string(),
                result,
            })
            .await?;

        info!(analysis_id = id, snapshot_id, kind = %kind, "📊 Analysis stored");
        Ok(id)
    }

    pub async fn get_snapshot(&self, id: SnapshotId) -> RepolensResult<Option<Snapshot>> {
        self.store.get_snapshot(id).await
    }

    pub async fn get_analysis(&self, id: AnalysisId) -> RepolensResult<Option<Analysis>> {
        self.store.get_analysis(id).await
    }

    /// Analysis plus the name of its repository
    pub async fn get_analysis_details(
        &self,
        id: AnalysisId,
    ) -> RepolensResult<Option<AnalysisDetails>> {
        let Some(analysis) = self.store.get_analysis(id).await? else {
            return Ok(None);
        };

        // Snapshots are never deleted, so a stored analysis always has one
        let snapshot = self
            .store
            .get_snapshot(analysis.snapshot_id)
            .await?
            .ok_or_else(|| {
                not_found_error!(format!("snapshot {}", analysis.snapshot_id), "application")
            })?;

        Ok(Some(AnalysisDetails {
            analysis,
            repository_name: snapshot.name,
        }))
    }

    /// Any failing store call marks the store unhealthy; failed counts read as 0
    pub async fn store_status(&self) -> StoreStatus {
        let mut healthy = true;
        if let Err(e) = self.store.health_check().await {
            warn!(error = %e, "Store health check failed");
            healthy = false;
        }

        let snapshots = match self.store.count_snapshots().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to count snapshots");
                healthy = false;
                0
            }
        };
        let analyses = match self.store.count_analyses().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to count analyses");
                healthy = false;
                0
            }
        };

        StoreStatus {
            backend: self.store.backend(),
            healthy,
            snapshots,
            analyses,
        }
    }
}

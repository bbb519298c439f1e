use super::SnapshotStore;
use async_trait::async_trait;
use chrono::Utc;
use repolens_core::{
    not_found_error, Analysis, AnalysisId, NewAnalysis, NewSnapshot, RepolensResult, Snapshot,
    SnapshotId,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Tables {
    last_snapshot_id: SnapshotId,
    last_analysis_id: AnalysisId,
    snapshots: HashMap<SnapshotId, Snapshot>,
    analyses: HashMap<AnalysisId, Analysis>,
}

/// In-process store for tests and throwaway servers
#[derive(Default)]
pub struct MemorySnapshotStore {
    tables: RwLock<Tables>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn put_snapshot(&self, snapshot: NewSnapshot) -> RepolensResult<SnapshotId> {
        let mut tables = self.tables.write().await;
        tables.last_snapshot_id += 1;
        let id = tables.last_snapshot_id;

        tables.snapshots.insert(
            id,
            Snapshot {
                id,
                name: snapshot.name,
                url: snapshot.url,
                created_at: Utc::now(),
                payload: snapshot.payload,
            },
        );

        debug!(snapshot_id = id, "Saved snapshot to memory storage");
        Ok(id)
    }

    async fn get_snapshot(&self, id: SnapshotId) -> RepolensResult<Option<Snapshot>> {
        let tables = self.tables.read().await;
        Ok(tables.snapshots.get(&id).cloned())
    }

    async fn put_analysis(&self, analysis: NewAnalysis) -> RepolensResult<AnalysisId> {
        // Existence check and insert happen under one write lock
        let mut tables = self.tables.write().await;
        if !tables.snapshots.contains_key(&analysis.snapshot_id) {
            return Err(not_found_error!(
                format!("snapshot {}", analysis.snapshot_id),
                "memory_store"
            ));
        }

        tables.last_analysis_id += 1;
        let id = tables.last_analysis_id;

        tables.analyses.insert(
            id,
            Analysis {
                id,
                snapshot_id: analysis.snapshot_id,
                kind: analysis.kind,
                result: analysis.result,
                created_at: Utc::now(),
            },
        );

        debug!(analysis_id = id, "Saved analysis to memory storage");
        Ok(id)
    }

    async fn get_analysis(&self, id: AnalysisId) -> RepolensResult<Option<Analysis>> {
        let tables = self.tables.read().await;
        Ok(tables.analyses.get(&id).cloned())
    }

    async fn count_snapshots(&self) -> RepolensResult<u64> {
        Ok(self.tables.read().await.snapshots.len() as u64)
    }

    async fn count_analyses(&self) -> RepolensResult<u64> {
        Ok(self.tables.read().await.analyses.len() as u64)
    }

    async fn health_check(&self) -> RepolensResult<()> {
        // Memory storage is always healthy
        Ok(())
    }
}

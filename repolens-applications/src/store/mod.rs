//! Snapshot storage backends
//!
//! Snapshots and analyses are written once and never updated or deleted.
//! Every backend hands out its own integer ids.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemorySnapshotStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSnapshotStore;

use async_trait::async_trait;
use repolens_core::{
    config_error, Analysis, AnalysisId, NewAnalysis, NewSnapshot, RepolensResult, Snapshot,
    SnapshotId,
};
use std::sync::Arc;
use tracing::info;

/// Persistence for snapshots and the analyses derived from them
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    /// Store a new snapshot atomically and return its id
    async fn put_snapshot(&self, snapshot: NewSnapshot) -> RepolensResult<SnapshotId>;

    async fn get_snapshot(&self, id: SnapshotId) -> RepolensResult<Option<Snapshot>>;

    /// Store a new analysis; fails with `NotFound` if its snapshot does not exist
    async fn put_analysis(&self, analysis: NewAnalysis) -> RepolensResult<AnalysisId>;

    async fn get_analysis(&self, id: AnalysisId) -> RepolensResult<Option<Analysis>>;

    async fn count_snapshots(&self) -> RepolensResult<u64>;

    async fn count_analyses(&self) -> RepolensResult<u64>;

    /// Health check for the storage backend
    async fn health_check(&self) -> RepolensResult<()>;
}

/// Open the backend named by `database_url`
///
/// `memory` selects the in-process store; anything starting with `sqlite:`
/// opens (or creates) a SQLite database.
pub async fn open_store(database_url: &str) -> RepolensResult<Arc<dyn SnapshotStore>> {
    if database_url == "memory" {
        info!("🧠 Using in-memory snapshot store");
        return Ok(Arc::new(MemorySnapshotStore::new()));
    }

    if database_url.starts_with("sqlite:") {
        #[cfg(feature = "sqlite")]
        {
            let store = SqliteSnapshotStore::connect(database_url).await?;
            return Ok(Arc::new(store));
        }

        #[cfg(not(feature = "sqlite"))]
        return Err(config_error!(
            "SQLite support is not compiled in; rebuild with the `sqlite` feature",
            "snapshot_store"
        ));
    }

    Err(config_error!(
        format!(
            "Unsupported database URL '{}': expected `memory` or `sqlite:<path>`",
            database_url
        ),
        "snapshot_store"
    ))
}

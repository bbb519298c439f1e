use super::SnapshotStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use repolens_core::{
    not_found_error, Analysis, AnalysisId, ErrorContext, NewAnalysis, NewSnapshot,
    RepolensError, RepolensResult, Snapshot, SnapshotId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite-backed store
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    /// Connect to `sqlite:<path>` or `sqlite::memory:` and create the tables
    pub async fn connect(database_url: &str) -> RepolensResult<Self> {
        info!(database_url = %database_url, "🔗 Connecting to SQLite database");

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| db_error("parse_url", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let pool_options = if in_memory {
            // The in-memory database is dropped with its last connection
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    info!(directory = %parent.display(), "📁 Creating database directory");
                    std::fs::create_dir_all(parent).map_err(|e| RepolensError::Storage {
                        message: format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ),
                        source: Some(Box::new(e)),
                        context: ErrorContext::new("sqlite_store")
                            .with_operation("create_directory"),
                    })?;
                }
            }
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| db_error("connect", e))?;

        let store = Self { pool };
        store.create_tables().await?;

        info!("✅ SQLite snapshot store ready");
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_tables(&self) -> RepolensResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS repositories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                url TEXT NOT NULL,
                created_at TEXT NOT NULL,
                packaged_data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create_repositories_table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                repository_id INTEGER NOT NULL REFERENCES repositories(id),
                analysis_type TEXT NOT NULL,
                result TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create_analyses_table", e))?;

        debug!("Database tables created");
        Ok(())
    }

    fn row_to_snapshot(row: &SqliteRow) -> RepolensResult<Snapshot> {
        let payload: String = row
            .try_get("packaged_data")
            .map_err(|e| db_error("read_snapshot", e))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| db_error("read_snapshot", e))?;

        Ok(Snapshot {
            id: row.try_get("id").map_err(|e| db_error("read_snapshot", e))?,
            name: row.try_get("name").map_err(|e| db_error("read_snapshot", e))?,
            url: row.try_get("url").map_err(|e| db_error("read_snapshot", e))?,
            created_at: parse_timestamp(&created_at)?,
            payload: serde_json::from_str(&payload)?,
        })
    }

    fn row_to_analysis(row: &SqliteRow) -> RepolensResult<Analysis> {
        let result: String = row
            .try_get("result")
            .map_err(|e| db_error("read_analysis", e))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| db_error("read_analysis", e))?;

        Ok(Analysis {
            id: row.try_get("id").map_err(|e| db_error("read_analysis", e))?,
            snapshot_id: row
                .try_get("repository_id")
                .map_err(|e| db_error("read_analysis", e))?,
            kind: row
                .try_get("analysis_type")
                .map_err(|e| db_error("read_analysis", e))?,
            result: serde_json::from_str(&result)?,
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn put_snapshot(&self, snapshot: NewSnapshot) -> RepolensResult<SnapshotId> {
        let payload = serde_json::to_string(&snapshot.payload)?;

        let result = sqlx::query(
            "INSERT INTO repositories (name, url, created_at, packaged_data) VALUES (?, ?, ?, ?)",
        )
        .bind(&snapshot.name)
        .bind(&snapshot.url)
        .bind(Utc::now().to_rfc3339())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("put_snapshot", e))?;

        let id = result.last_insert_rowid();
        debug!(snapshot_id = id, "Saved snapshot to SQLite storage");
        Ok(id)
    }

    async fn get_snapshot(&self, id: SnapshotId) -> RepolensResult<Option<Snapshot>> {
        let row = sqlx::query(
            "SELECT id, name, url, created_at, packaged_data FROM repositories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("get_snapshot", e))?;

        row.as_ref().map(Self::row_to_snapshot).transpose()
    }

    async fn put_analysis(&self, analysis: NewAnalysis) -> RepolensResult<AnalysisId> {
        let result_json = serde_json::to_string(&analysis.result)?;

        // Single statement: nothing is inserted when the snapshot is missing
        let result = sqlx::query(
            r#"
            INSERT INTO analyses (repository_id, analysis_type, result, created_at)
            SELECT ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM repositories WHERE id = ?)
            "#,
        )
        .bind(analysis.snapshot_id)
        .bind(&analysis.kind)
        .bind(result_json)
        .bind(Utc::now().to_rfc3339())
        .bind(analysis.snapshot_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("put_analysis", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error!(
                format!("snapshot {}", analysis.snapshot_id),
                "sqlite_store"
            ));
        }

        let id = result.last_insert_rowid();
        debug!(analysis_id = id, "Saved analysis to SQLite storage");
        Ok(id)
    }

    async fn get_analysis(&self, id: AnalysisId) -> RepolensResult<Option<Analysis>> {
        let row = sqlx::query(
            "SELECT id, repository_id, analysis_type, result, created_at FROM analyses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("get_analysis", e))?;

        row.as_ref().map(Self::row_to_analysis).transpose()
    }

    async fn count_snapshots(&self) -> RepolensResult<u64> {
        let count: i64 = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM repositories")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count_snapshots", e))?;
        Ok(count as u64)
    }

    async fn count_analyses(&self) -> RepolensResult<u64> {
        let count: i64 = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM analyses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count_analyses", e))?;
        Ok(count as u64)
    }

    async fn health_check(&self) -> RepolensResult<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("health_check", e))?;

        Ok(())
    }
}

fn parse_timestamp(value: &str) -> RepolensResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RepolensError::Storage {
            message: format!("Invalid timestamp '{}' in database: {}", value, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("sqlite_store").with_operation("parse_timestamp"),
        })
}

fn db_error(operation: &str, error: sqlx::Error) -> RepolensError {
    RepolensError::Storage {
        message: format!("SQLite {} failed: {}", operation, error),
        source: Some(Box::new(error)),
        context: ErrorContext::new("sqlite_store").with_operation(operation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repolens_core::SnapshotPayload;

    #[tokio::test]
    async fn test_file_database_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("nested/repolens.db").display());

        let id = {
            let store = SqliteSnapshotStore::connect(&url).await.unwrap();
            store
                .put_snapshot(NewSnapshot {
                    name: "demo".to_string(),
                    url: "https://example.com/demo.git".to_string(),
                    payload: SnapshotPayload {
                        branches: vec!["main".to_string()],
                        ..SnapshotPayload::default()
                    },
                })
                .await
                .unwrap()
        };

        let store = SqliteSnapshotStore::connect(&url).await.unwrap();
        let snapshot = store.get_snapshot(id).await.unwrap().unwrap();
        assert_eq!(snapshot.name, "demo");
        assert_eq!(snapshot.payload.branches, vec!["main".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_serialization_error() {
        let store = SqliteSnapshotStore::connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            "INSERT INTO repositories (name, url, created_at, packaged_data) VALUES ('x', 'y', ?, '{not json')",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(store.pool())
        .await
        .unwrap();

        let err = store.get_snapshot(1).await.unwrap_err();
        assert_eq!(err.category(), "serialization");
    }
}

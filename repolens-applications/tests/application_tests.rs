//! End-to-end tests of the packaging and analysis service

mod common;

use common::{make_sample_repo, path_url};
use async_trait::async_trait;
use repolens_applications::{open_store, MemorySnapshotStore, RepolensApplication, SnapshotStore};
use repolens_core::{
    storage_error, Analysis, AnalysisId, NewAnalysis, NewSnapshot, RepolensConfig, RepolensError,
    RepolensResult, Snapshot, SnapshotId, SnapshotPayload,
};
use std::sync::Arc;
use repolens_repo::AnalysisKind;
use serde_json::{json, Value};

async fn application(database_url: &str) -> RepolensApplication {
    let store = open_store(database_url).await.unwrap();
    RepolensApplication::builder(RepolensConfig::default())
        .with_store(store)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_package_and_analyze_sample_repository() {
    for database_url in ["memory", "sqlite::memory:"] {
        let app = application(database_url).await;
        let source = make_sample_repo();

        let snapshot_id = app.package(&path_url(source.path())).await.unwrap();
        let snapshot = app.get_snapshot(snapshot_id).await.unwrap().unwrap();
        assert_eq!(snapshot.payload.files.len(), 3);

        let expectations = [
            ("file_count", json!({"total_files": 3})),
            ("file_types", json!({"file_types": {"py": 1, "js": 1, "unknown": 1}})),
            ("commit_count", json!({"total_commits": 2})),
            ("branch_count", json!({"total_branches": 1})),
        ];

        for (kind, expected) in expectations {
            let analysis_id = app.analyze(snapshot_id, kind).await.unwrap();
            let details = app
                .get_analysis_details(analysis_id)
                .await
                .unwrap()
                .unwrap();

            assert_eq!(details.analysis.kind, kind);
            assert_eq!(details.analysis.snapshot_id, snapshot_id);
            assert_eq!(details.analysis.result, expected, "{database_url}: {kind}");
            assert_eq!(details.repository_name, snapshot.name);
        }

        assert_eq!(app.store().count_analyses().await.unwrap(), 4);
    }
}

#[tokio::test]
async fn test_repackaging_creates_independent_snapshots() {
    let app = application("memory").await;
    let source = make_sample_repo();
    let url = path_url(source.path());

    let first = app.package(&url).await.unwrap();
    let second = app.package(&url).await.unwrap();
    assert_ne!(first, second);

    let a = app.get_snapshot(first).await.unwrap().unwrap();
    let b = app.get_snapshot(second).await.unwrap().unwrap();
    assert_eq!(a.payload, b.payload);
    assert_eq!(app.store().count_snapshots().await.unwrap(), 2);
}

#[tokio::test]
async fn test_get_is_idempotent() {
    let app = application("sqlite::memory:").await;
    let source = make_sample_repo();
    let id = app.package(&path_url(source.path())).await.unwrap();

    let first = app.get_snapshot(id).await.unwrap();
    let second = app.get_snapshot(id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_url_is_rejected_before_cloning() {
    let app = application("memory").await;

    for url in ["", "   "] {
        let err = app.package(url).await.unwrap_err();
        match err {
            RepolensError::InvalidRequest { field, .. } => {
                assert_eq!(field.as_deref(), Some("repo_url"));
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }
    assert_eq!(app.store().count_snapshots().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_clone_stores_nothing() {
    let app = application("memory").await;
    let dir = tempfile::tempdir().unwrap();

    let err = app
        .package(&path_url(&dir.path().join("missing")))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "clone_failed");
    assert_eq!(app.store().count_snapshots().await.unwrap(), 0);
}

#[tokio::test]
async fn test_analyze_rejections_leave_no_trace() {
    let app = application("memory").await;
    let source = make_sample_repo();
    let id = app.package(&path_url(source.path())).await.unwrap();

    let err = app.analyze(id + 100, "file_count").await.unwrap_err();
    assert!(matches!(err, RepolensError::NotFound { .. }));

    let err = app.analyze(id, "line_count").await.unwrap_err();
    assert!(matches!(err, RepolensError::InvalidRequest { .. }));

    assert_eq!(app.store().count_analyses().await.unwrap(), 0);
}

#[tokio::test]
async fn test_summary_kind() {
    let app = application("memory").await;
    let source = make_sample_repo();
    let id = app.package(&path_url(source.path())).await.unwrap();

    let analysis_id = app.analyze(id, "summary").await.unwrap();
    let analysis = app.get_analysis(analysis_id).await.unwrap().unwrap();

    assert_eq!(analysis.result["file_count"], 3);
    assert_eq!(analysis.result["commit_count"], 2);
    assert_eq!(analysis.result["total_lines"], 4);
    assert_eq!(
        analysis.result["top_contributors"],
        json!({"Test User <test@example.com>": 2})
    );
}

#[tokio::test]
async fn test_custom_kind_is_dispatched() {
    struct LargestFile;

    impl AnalysisKind for LargestFile {
        fn name(&self) -> &'static str {
            "largest_file"
        }

        fn description(&self) -> &'static str {
            "Path of the biggest file"
        }

        fn compute(&self, payload: &SnapshotPayload) -> Value {
            let largest = payload.files.iter().max_by_key(|f| f.size);
            json!({ "largest_file": largest.map(|f| f.path.clone()) })
        }
    }

    let store = open_store("memory").await.unwrap();
    let app = RepolensApplication::builder(RepolensConfig::default())
        .with_store(store)
        .with_analysis_kind(LargestFile)
        .build()
        .await
        .unwrap();

    let source = make_sample_repo();
    let id = app.package(&path_url(source.path())).await.unwrap();
    let analysis_id = app.analyze(id, "largest_file").await.unwrap();
    let analysis = app.get_analysis(analysis_id).await.unwrap().unwrap();

    assert_eq!(analysis.result, json!({"largest_file": "b.js"}));
}

#[tokio::test]
async fn test_store_status() {
    let app = application("sqlite::memory:").await;
    let status = app.store_status().await;

    assert_eq!(status.backend, "sqlite");
    assert!(status.healthy);
    assert_eq!(status.snapshots, 0);
    assert_eq!(status.analyses, 0);
}

/// Answers health checks but cannot count
struct UncountableStore {
    inner: MemorySnapshotStore,
}

#[async_trait]
impl SnapshotStore for UncountableStore {
    fn backend(&self) -> &'static str {
        "uncountable"
    }

    async fn put_snapshot(&self, snapshot: NewSnapshot) -> RepolensResult<SnapshotId> {
        self.inner.put_snapshot(snapshot).await
    }

    async fn get_snapshot(&self, id: SnapshotId) -> RepolensResult<Option<Snapshot>> {
        self.inner.get_snapshot(id).await
    }

    async fn put_analysis(&self, analysis: NewAnalysis) -> RepolensResult<AnalysisId> {
        self.inner.put_analysis(analysis).await
    }

    async fn get_analysis(&self, id: AnalysisId) -> RepolensResult<Option<Analysis>> {
        self.inner.get_analysis(id).await
    }

    async fn count_snapshots(&self) -> RepolensResult<u64> {
        Err(storage_error!("count unavailable", "uncountable_store"))
    }

    async fn count_analyses(&self) -> RepolensResult<u64> {
        self.inner.count_analyses().await
    }

    async fn health_check(&self) -> RepolensResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_store_status_reports_failed_counts_as_unhealthy() {
    let store = Arc::new(UncountableStore {
        inner: MemorySnapshotStore::new(),
    });
    let app = RepolensApplication::builder(RepolensConfig::default())
        .with_store(store)
        .build()
        .await
        .unwrap();

    let status = app.store_status().await;
    assert_eq!(status.backend, "uncountable");
    assert!(!status.healthy);
    assert_eq!(status.snapshots, 0);
    assert_eq!(status.analyses, 0);
}

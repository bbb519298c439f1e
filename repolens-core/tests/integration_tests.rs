//! Integration tests for repolens-core infrastructure

use repolens_core::{
    config_error, init_logging, not_found_error, storage_error, with_timeout, LogFormat,
    LoggingConfig, RepolensConfig, RepolensError, Snapshot, SnapshotPayload,
};
use std::time::Duration;

#[tokio::test]
async fn test_error_handling() {
    let error = storage_error!("Test storage error", "test_component");

    match &error {
        RepolensError::Storage {
            message, context, ..
        } => {
            assert_eq!(message, "Test storage error");
            assert_eq!(context.component, "test_component");
            assert!(!context.error_id.is_empty());
        }
        _ => panic!("Expected Storage error"),
    }

    // Logging an error must not panic without a subscriber
    error.log();
    assert!(error.is_recoverable());

    let config_error = config_error!("Invalid config", "test");
    assert!(!config_error.is_recoverable());
    let suggestions = &config_error.context().unwrap().recovery_suggestions;
    assert!(suggestions.iter().any(|s| s.contains("config --init")));

    let missing = not_found_error!("analysis 3", "test");
    assert_eq!(missing.http_status(), 404);
}

#[tokio::test]
async fn test_logging_initialization() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        include_location: false,
        enable_performance_monitoring: false,
        filter_directives: vec!["repolens_core=debug".to_string()],
        ..LoggingConfig::default()
    };

    // Only one global subscriber per process; another test may have won
    let _ = init_logging(&config);
    tracing::info!("logging initialized");
}

#[tokio::test]
async fn test_logging_to_file_requires_path() {
    let config = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..LoggingConfig::default()
    };
    assert!(init_logging(&config).is_err());
}

#[tokio::test]
async fn test_timeout_wraps_slow_operation() {
    let err = with_timeout(
        tokio::time::sleep(Duration::from_millis(100)),
        5,
        "clone",
    )
    .await
    .unwrap_err();

    assert_eq!(err.category(), "timeout");
    assert_eq!(err.http_status(), 504);
}

#[test]
fn test_default_config_is_valid_and_serializable() {
    let config = RepolensConfig::default();
    config.validate().unwrap();

    let text = toml::to_string_pretty(&config).unwrap();
    assert!(text.contains("[fetch]"));
    assert!(text.contains("[walk]"));
    assert!(text.contains("[storage]"));
    assert!(text.contains("[cache]"));

    let parsed: RepolensConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_snapshot_summary_drops_payload() {
    let snapshot = Snapshot {
        id: 9,
        name: "demo".to_string(),
        url: "https://example.com/demo.git".to_string(),
        created_at: chrono::Utc::now(),
        payload: SnapshotPayload {
            branches: vec!["main".to_string()],
            ..SnapshotPayload::default()
        },
    };

    let summary = serde_json::to_value(snapshot.summary()).unwrap();
    assert_eq!(summary["id"], 9);
    assert_eq!(summary["name"], "demo");
    assert!(summary.get("payload").is_none());
}

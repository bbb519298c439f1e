//! Shared helpers for the HTTP test suites
//!
//! Builds application state over an in-memory store, spawns a server on a
//! random port, and creates fixture repositories with the git CLI.

#![allow(dead_code)]

use repolens_applications::{open_store, RepolensApplication};
use repolens_core::RepolensConfig;
use repolens_web::{AppState, RepolensServer, ResponseCache, WebConfig};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Once;
use std::time::Duration;
use tokio::net::TcpListener;

static TRACING: Once = Once::new();

/// Set TEST_LOG to see server logs while tests run
fn init_test_logging() {
    TRACING.call_once(|| {
        if std::env::var("TEST_LOG").is_ok() {
            repolens_web::init_logging("debug", false).ok();
        }
    });
}

/// State over a fresh in-memory store
pub async fn test_state() -> AppState {
    init_test_logging();

    let store = open_store("memory").await.unwrap();
    let application = RepolensApplication::builder(RepolensConfig::default())
        .with_store(store)
        .build()
        .await
        .unwrap();

    AppState::from_parts(
        WebConfig::default(),
        application,
        ResponseCache::new(16, Duration::from_secs(60)),
    )
}

/// Running server plus a client pointed at it
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub state: AppState,
}

impl TestApp {
    pub async fn post_package(&self, body: &Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/package", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_analyze(&self, body: &Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/analyze", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_repository(&self, id: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/repository/{}", &self.address, id))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_analysis(&self, id: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/analysis/{}", &self.address, id))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_health(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/health", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Start a server on a free port
pub async fn spawn_app() -> TestApp {
    let state = test_state().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = RepolensServer::with_state(state.clone());
    tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        api_client: reqwest::Client::new(),
        state,
    }
}

fn run_git(repo_dir: &Path, args: &[&str], date: &str) {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=Test User",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .current_dir(repo_dir)
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// `a.py` and `b.js` in a first commit, `README` in a second, on `main`
pub fn make_sample_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let first = "2024-01-01T10:00:00+02:00";
    let second = "2024-01-02T12:30:00+02:00";

    run_git(root, &["init"], first);
    run_git(root, &["symbolic-ref", "HEAD", "refs/heads/main"], first);

    fs::write(root.join("a.py"), "print('a')\n").unwrap();
    fs::write(root.join("b.js"), "console.log('b');\nexport {};\n").unwrap();
    run_git(root, &["add", "a.py", "b.js"], first);
    run_git(root, &["commit", "-m", "Add sources"], first);

    fs::write(root.join("README"), "Sample repository").unwrap();
    run_git(root, &["add", "README"], second);
    run_git(root, &["commit", "-m", "Add README"], second);

    dir
}

pub fn path_url(dir: &Path) -> String {
    dir.display().to_string()
}

/// Last path component, which is what packaging records as the name
pub fn dir_name(dir: &Path) -> String {
    dir.file_name().unwrap().to_string_lossy().into_owned()
}

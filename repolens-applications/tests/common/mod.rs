//! Fixture repositories built with the git CLI

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::Command;

pub const FIRST_COMMIT_DATE: &str = "2024-01-01T10:00:00+02:00";
pub const SECOND_COMMIT_DATE: &str = "2024-01-02T12:30:00+02:00";

pub fn run_git(repo_dir: &Path, args: &[&str]) {
    run_git_at(repo_dir, args, FIRST_COMMIT_DATE);
}

fn run_git_at(repo_dir: &Path, args: &[&str], date: &str) {
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

    run_git(root, &["init"]);
    run_git(root, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    fs::write(root.join("a.py"), "print('a')\n").unwrap();
    fs::write(root.join("b.js"), "console.log('b');\nexport {};\n").unwrap();
    run_git_at(root, &["add", "a.py", "b.js"], FIRST_COMMIT_DATE);
    run_git_at(root, &["commit", "-m", "Add sources"], FIRST_COMMIT_DATE);

    fs::write(root.join("README"), "Sample repository").unwrap();
    run_git_at(root, &["add", "README"], SECOND_COMMIT_DATE);
    run_git_at(
        root,
        &["commit", "-m", "Add README\n\nWith a body line."],
        SECOND_COMMIT_DATE,
    );

    dir
}

/// A repository with no commits at all
pub fn make_empty_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init"]);
    run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
    dir
}

pub fn path_url(dir: &Path) -> String {
    dir.display().to_string()
}

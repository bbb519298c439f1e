//! Repository walker
//!
//! Turns a populated working directory into a [`SnapshotPayload`]: every
//! regular file with its size, the history reachable from HEAD and the local
//! branches. All of it is blocking I/O; async callers go through
//! `spawn_blocking`.

use crate::filter::PathFilter;
use chrono::{DateTime, FixedOffset};
use git2::{BranchType, Commit, ErrorCode, Repository, Sort};
use ignore::WalkBuilder;
use repolens_core::{
    CommitEntry, ErrorContext, FileEntry, RepolensError, RepolensResult, SnapshotPayload,
    WalkConfig,
};
use std::path::{Component, Path};
use tracing::{debug, info};

const VCS_DIR: &str = ".git";

/// Walker settings with compiled exclusion patterns
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub include_vcs_metadata: bool,
    pub count_lines: bool,
    pub respect_gitignore: bool,
    pub filter: PathFilter,
}

impl WalkOptions {
    pub fn from_config(config: &WalkConfig) -> RepolensResult<Self> {
        Ok(Self {
            include_vcs_metadata: config.include_vcs_metadata,
            count_lines: config.count_lines,
            respect_gitignore: config.respect_gitignore,
            filter: PathFilter::new(&config.exclude_patterns)?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RepositoryWalker {
    options: WalkOptions,
}

impl RepositoryWalker {
    pub fn new(options: WalkOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Build the full payload for a working directory
    pub fn walk(&self, root: &Path) -> RepolensResult<SnapshotPayload> {
        let files = self.collect_files(root)?;
        let repo = open_repository(root)?;
        let commits = collect_commits(&repo)?;
        let branches = collect_branches(&repo)?;

        info!(
            root = %root.display(),
            files = files.len(),
            commits = commits.len(),
            branches = branches.len(),
            "📦 Working tree walked"
        );

        Ok(SnapshotPayload {
            files,
            commits,
            branches,
        })
    }

    /// Every regular file under `root`, in traversal order
    pub fn collect_files(&self, root: &Path) -> RepolensResult<Vec<FileEntry>> {
        if !root.is_dir() {
            return Err(RepolensError::TraversalFailed {
                message: format!("{} is not a directory", root.display()),
                source: None,
                context: ErrorContext::new("repository_walker")
                    .with_operation("walk_files")
                    .with_metadata("path", &root.display().to_string()),
            });
        }

        let mut builder = WalkBuilder::new(root);
        builder.standard_filters(false).follow_links(false);

        if self.options.respect_gitignore {
            builder.git_ignore(true).git_exclude(true);
        }

        if !self.options.include_vcs_metadata {
            builder.filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == VCS_DIR));
        }

        let mut files = Vec::new();

        for result in builder.build() {
            let entry = result.map_err(|e| traversal_error("walk_files", root, e))?;

            // Symlinks are reported as such because links are not followed
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let relative = relative_path(root, path)?;

            if self.options.filter.is_excluded(&relative) {
                debug!(path = %relative, "Excluded by pattern");
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| traversal_error("read_metadata", path, e))?;

            let lines = if self.options.count_lines {
                let bytes =
                    std::fs::read(path).map_err(|e| traversal_error("count_lines", path, e))?;
                Some(count_lines(&bytes))
            } else {
                None
            };

            files.push(FileEntry {
                path: relative,
                size: metadata.len(),
                lines,
            });
        }

        Ok(files)
    }
}

/// Commits and local branches of the repository at `root`
pub fn collect_history(root: &Path) -> RepolensResult<(Vec<CommitEntry>, Vec<String>)> {
    let repo = open_repository(root)?;
    Ok((collect_commits(&repo)?, collect_branches(&repo)?))
}

fn open_repository(root: &Path) -> RepolensResult<Repository> {
    Repository::open(root).map_err(|e| traversal_error("open_repository", root, e))
}

fn collect_commits(repo: &Repository) -> RepolensResult<Vec<CommitEntry>> {
    let path = repo.path();
    let mut revwalk = repo
        .revwalk()
        .map_err(|e| traversal_error("revwalk", path, e))?;
    revwalk
        .set_sorting(Sort::TIME)
        .map_err(|e| traversal_error("revwalk", path, e))?;

    match revwalk.push_head() {
        Ok(()) => {}
        // Empty repository: HEAD points at a branch with no commits yet
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            debug!(path = %path.display(), "HEAD is unborn, no history to read");
            return Ok(Vec::new());
        }
        Err(e) => return Err(traversal_error("push_head", path, e)),
    }

    let mut commits = Vec::new();
    for oid in revwalk {
        let oid = oid.map_err(|e| traversal_error("revwalk", path, e))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| traversal_error("find_commit", path, e))?;
        commits.push(commit_entry(&commit)?);
    }

    Ok(commits)
}

fn commit_entry(commit: &Commit<'_>) -> RepolensResult<CommitEntry> {
    let author = commit.author();
    let author = format!(
        "{} <{}>",
        String::from_utf8_lossy(author.name_bytes()),
        String::from_utf8_lossy(author.email_bytes())
    );

    Ok(CommitEntry {
        hash: commit.id().to_string(),
        author,
        message: String::from_utf8_lossy(commit.message_raw_bytes()).into_owned(),
        date: commit_date(commit)?,
    })
}

/// Committer time in the committer's own offset
fn commit_date(commit: &Commit<'_>) -> RepolensResult<DateTime<FixedOffset>> {
    let time = commit.time();
    let invalid = || RepolensError::TraversalFailed {
        message: format!("Commit {} has an invalid timestamp", commit.id()),
        source: None,
        context: ErrorContext::new("repository_walker")
            .with_operation("commit_date")
            .with_metadata("seconds", &time.seconds().to_string())
            .with_metadata("offset_minutes", &time.offset_minutes().to_string()),
    };

    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).ok_or_else(invalid)?;
    let utc = DateTime::from_timestamp(time.seconds(), 0).ok_or_else(invalid)?;
    Ok(utc.with_timezone(&offset))
}

fn collect_branches(repo: &Repository) -> RepolensResult<Vec<String>> {
    let path = repo.path();
    let branches = repo
        .branches(Some(BranchType::Local))
        .map_err(|e| traversal_error("branches", path, e))?;

    let mut names = Vec::new();
    for branch in branches {
        let (branch, _) = branch.map_err(|e| traversal_error("branches", path, e))?;
        let name = branch
            .name_bytes()
            .map_err(|e| traversal_error("branch_name", path, e))?;
        names.push(String::from_utf8_lossy(name).into_owned());
    }

    Ok(names)
}

/// `/`-joined path of `path` relative to `root`
fn relative_path(root: &Path, path: &Path) -> RepolensResult<String> {
    let relative = path.strip_prefix(root).map_err(|e| RepolensError::TraversalFailed {
        message: format!("{} is outside {}", path.display(), root.display()),
        source: Some(Box::new(e)),
        context: ErrorContext::new("repository_walker").with_operation("relative_path"),
    })?;

    Ok(relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/"))
}

/// Newline count, plus one for a trailing line without a terminator
pub fn count_lines(bytes: &[u8]) -> u64 {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count() as u64;
    match bytes.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

fn traversal_error<E>(operation: &str, path: &Path, error: E) -> RepolensError
where
    E: std::error::Error + Send + Sync + 'static,
{
    RepolensError::TraversalFailed {
        message: format!("{} failed for {}: {}", operation, path.display(), error),
        source: Some(Box::new(error)),
        context: ErrorContext::new("repository_walker")
            .with_operation(operation)
            .with_metadata("path", &path.display().to_string()),
    }
}

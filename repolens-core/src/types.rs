//! Core data type definitions

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Generated identifier of a persisted snapshot
pub type SnapshotId = i64;

/// Generated identifier of a persisted analysis
pub type AnalysisId = i64;

/// A regular file found in the working tree at packaging time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the working root, `/`-separated
    pub path: String,
    /// Size in bytes as reported by the filesystem
    pub size: u64,
    /// Number of lines, when line counting was enabled for the walk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<u64>,
}

/// One commit reachable from the checked-out reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    /// Full 40-character hex object id
    pub hash: String,
    /// `Name <email>`
    pub author: String,
    /// Raw message, untrimmed
    pub message: String,
    /// Commit timestamp with its original offset
    pub date: DateTime<FixedOffset>,
}

/// Everything extracted from one working tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub files: Vec<FileEntry>,
    /// Newest first
    pub commits: Vec<CommitEntry>,
    /// Local branches only, in enumeration order
    pub branches: Vec<String>,
}

/// A snapshot that has been built but not yet persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub name: String,
    pub url: String,
    pub payload: SnapshotPayload,
}

/// The persisted record of one packaging operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub payload: SnapshotPayload,
}

impl Snapshot {
    /// Metadata without the payload
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            id: self.id,
            name: self.name.clone(),
            url: self.url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Snapshot metadata as exposed to transports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: SnapshotId,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// An analysis result that has been computed but not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalysis {
    pub snapshot_id: SnapshotId,
    pub kind: String,
    pub result: serde_json::Value,
}

/// A persisted, immutable aggregate computed from one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: AnalysisId,
    pub snapshot_id: SnapshotId,
    pub kind: String,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

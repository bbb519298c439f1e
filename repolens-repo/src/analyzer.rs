//! Analysis kinds computed over snapshot payloads
//!
//! Each kind is a pure function from a [`SnapshotPayload`] to a JSON result.
//! Kinds live in an [`AnalyzerRegistry`], so new ones can be added without
//! touching the dispatch code.

use repolens_core::{invalid_request, RepolensResult, SnapshotPayload};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// How many entries the `summary` histograms keep
const SUMMARY_TOP_N: usize = 5;

/// A named aggregate over a snapshot payload
pub trait AnalysisKind: Send + Sync {
    /// Tag stored with the analysis and used by callers to select it
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn compute(&self, payload: &SnapshotPayload) -> Value;
}

pub struct FileCount;

impl AnalysisKind for FileCount {
    fn name(&self) -> &'static str {
        "file_count"
    }

    fn description(&self) -> &'static str {
        "Number of files in the snapshot"
    }

    fn compute(&self, payload: &SnapshotPayload) -> Value {
        json!({ "total_files": payload.files.len() })
    }
}

pub struct CommitCount;

impl AnalysisKind for CommitCount {
    fn name(&self) -> &'static str {
        "commit_count"
    }

    fn description(&self) -> &'static str {
        "Number of commits reachable from HEAD"
    }

    fn compute(&self, payload: &SnapshotPayload) -> Value {
        json!({ "total_commits": payload.commits.len() })
    }
}

pub struct BranchCount;

impl AnalysisKind for BranchCount {
    fn name(&self) -> &'static str {
        "branch_count"
    }

    fn description(&self) -> &'static str {
        "Number of local branches"
    }

    fn compute(&self, payload: &SnapshotPayload) -> Value {
        json!({ "total_branches": payload.branches.len() })
    }
}

pub struct FileTypes;

impl AnalysisKind for FileTypes {
    fn name(&self) -> &'static str {
        "file_types"
    }

    fn description(&self) -> &'static str {
        "File count per extension"
    }

    fn compute(&self, payload: &SnapshotPayload) -> Value {
        let histogram = Histogram::from_keys(payload.files.iter().map(|f| file_extension(&f.path)));
        json!({ "file_types": histogram.into_json(None) })
    }
}

/// Combined overview: counts, line total and top-5 histograms
pub struct Summary;

impl AnalysisKind for Summary {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn description(&self) -> &'static str {
        "File and commit counts, total lines, top file types and top contributors"
    }

    fn compute(&self, payload: &SnapshotPayload) -> Value {
        let total_lines: u64 = payload.files.iter().filter_map(|f| f.lines).sum();
        let file_types =
            Histogram::from_keys(payload.files.iter().map(|f| file_extension(&f.path)));
        let contributors =
            Histogram::from_keys(payload.commits.iter().map(|c| c.author.as_str()));

        json!({
            "file_count": payload.files.len(),
            "commit_count": payload.commits.len(),
            "total_lines": total_lines,
            "file_types": file_types.into_json(Some(SUMMARY_TOP_N)),
            "top_contributors": contributors.into_json(Some(SUMMARY_TOP_N)),
        })
    }
}

/// Extension used for grouping: the text after the last `.` in the whole
/// path, or `unknown` when the path has no `.`
pub fn file_extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(idx) => &path[idx + 1..],
        None => "unknown",
    }
}

/// Counter that remembers first-seen order
struct Histogram<'a> {
    counts: Vec<(&'a str, u64)>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Histogram<'a> {
    fn from_keys(keys: impl Iterator<Item = &'a str>) -> Self {
        let mut histogram = Self {
            counts: Vec::new(),
            index: HashMap::new(),
        };
        for key in keys {
            match histogram.index.get(key) {
                Some(&slot) => histogram.counts[slot].1 += 1,
                None => {
                    histogram.index.insert(key, histogram.counts.len());
                    histogram.counts.push((key, 1));
                }
            }
        }
        histogram
    }

    /// Without a limit entries keep first-seen order. With one, entries are
    /// ranked by count and ties keep first-seen order.
    fn into_json(mut self, limit: Option<usize>) -> Value {
        if let Some(limit) = limit {
            // Stable sort keeps first-seen order among equal counts
            self.counts.sort_by(|a, b| b.1.cmp(&a.1));
            self.counts.truncate(limit);
        }

        let map: Map<String, Value> = self
            .counts
            .into_iter()
            .map(|(key, count)| (key.to_string(), Value::from(count)))
            .collect();
        Value::Object(map)
    }
}

/// Table of available analysis kinds
#[derive(Clone)]
pub struct AnalyzerRegistry {
    kinds: HashMap<&'static str, Arc<dyn AnalysisKind>>,
}

impl AnalyzerRegistry {
    /// A registry with no kinds at all
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Register a kind, replacing any kind with the same name
    pub fn register<K: AnalysisKind + 'static>(&mut self, kind: K) -> &mut Self {
        self.kinds.insert(kind.name(), Arc::new(kind));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn AnalysisKind> {
        self.kinds.get(name).map(|kind| kind.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Registered kinds sorted by name
    pub fn kinds(&self) -> Vec<&dyn AnalysisKind> {
        let mut kinds: Vec<&dyn AnalysisKind> = self.kinds.values().map(|k| k.as_ref()).collect();
        kinds.sort_by_key(|k| k.name());
        kinds
    }

    /// Run the named kind, rejecting names that are not registered
    pub fn compute(&self, name: &str, payload: &SnapshotPayload) -> RepolensResult<Value> {
        match self.get(name) {
            Some(kind) => Ok(kind.compute(payload)),
            None => Err(invalid_request!(
                format!("Unknown analysis type: {}", name),
                "analysis_type",
                "analyzer_registry"
            )),
        }
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(FileCount)
            .register(CommitCount)
            .register(BranchCount)
            .register(FileTypes)
            .register(Summary);
        registry
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.kinds.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("AnalyzerRegistry")
            .field("kinds", &names)
            .finish()
    }
}

//! Path filtering for the repository walker

use glob::Pattern;
use repolens_core::{ErrorContext, RepolensError, RepolensResult};

/// Compiled exclusion patterns
///
/// A file is excluded when any pattern matches either its relative path or
/// its bare file name, so `*.lock` and `docs/*.md` both work as expected.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    patterns: Vec<String>,
    compiled_patterns: Vec<Pattern>,
}

impl PathFilter {
    pub fn new(patterns: &[String]) -> RepolensResult<Self> {
        let mut filter = Self::default();
        for pattern in patterns {
            filter.add_pattern(pattern)?;
        }
        Ok(filter)
    }

    /// Add another glob pattern
    pub fn add_pattern(&mut self, pattern: &str) -> RepolensResult<()> {
        let compiled = Pattern::new(pattern).map_err(|e| RepolensError::Config {
            message: format!("Invalid glob pattern '{}': {}", pattern, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("path_filter")
                .with_operation("add_pattern")
                .with_metadata("pattern", pattern)
                .with_suggestion("Check walk.exclude_patterns in your configuration"),
        })?;

        self.patterns.push(pattern.to_string());
        self.compiled_patterns.push(compiled);
        Ok(())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.compiled_patterns.is_empty()
    }

    /// Whether a `/`-separated relative path should be left out
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        if self.compiled_patterns.is_empty() {
            return false;
        }

        let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);

        self.compiled_patterns
            .iter()
            .any(|pattern| pattern.matches(relative_path) || pattern.matches(file_name))
    }
}

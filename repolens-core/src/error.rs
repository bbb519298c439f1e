//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type RepolensResult<T> = Result<T, RepolensError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the RepoLens system
#[derive(Error, Debug)]
pub enum RepolensError {
    /// The source could not be cloned into a working directory
    #[error("Clone failed: {message}")]
    CloneFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// Reading files or history from a cloned working directory failed
    #[error("Traversal failed: {message}")]
    TraversalFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl RepolensError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            RepolensError::CloneFailed { context, .. } => Some(context),
            RepolensError::TraversalFailed { context, .. } => Some(context),
            RepolensError::NotFound { context, .. } => Some(context),
            RepolensError::InvalidRequest { context, .. } => Some(context),
            RepolensError::Storage { context, .. } => Some(context),
            RepolensError::Config { context, .. } => Some(context),
            RepolensError::Timeout { context, .. } => Some(context),
            RepolensError::Internal { context, .. } => Some(context),
            RepolensError::Io(_) | RepolensError::Serialization(_) => None,
        }
    }

    /// Check if error is recoverable
    ///
    /// Nothing is retried automatically; this only tells a caller whether
    /// re-issuing the same operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RepolensError::CloneFailed { .. } => true,
            RepolensError::Timeout { .. } => true,
            RepolensError::Storage { .. } => true,
            RepolensError::TraversalFailed { .. } => false,
            RepolensError::NotFound { .. } => false,
            RepolensError::InvalidRequest { .. } => false,
            RepolensError::Config { .. } => false,
            _ => false,
        }
    }

    /// Get error category for logs and responses
    pub fn category(&self) -> &'static str {
        match self {
            RepolensError::CloneFailed { .. } => "clone_failed",
            RepolensError::TraversalFailed { .. } => "traversal_failed",
            RepolensError::NotFound { .. } => "not_found",
            RepolensError::InvalidRequest { .. } => "invalid_request",
            RepolensError::Storage { .. } => "storage",
            RepolensError::Config { .. } => "config",
            RepolensError::Timeout { .. } => "timeout",
            RepolensError::Io(_) => "io",
            RepolensError::Serialization(_) => "serialization",
            RepolensError::Internal { .. } => "internal",
        }
    }

    /// Convert to HTTP status code
    pub fn http_status(&self) -> u16 {
        match self {
            RepolensError::NotFound { .. } => 404,
            RepolensError::InvalidRequest { .. } => 400,
            RepolensError::Timeout { .. } => 504,
            _ => 500,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            RepolensError::Internal { .. } | RepolensError::TraversalFailed { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Internal error occurred"
                );
            }
            RepolensError::InvalidRequest { .. } | RepolensError::NotFound { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Request rejected"
                );
            }
            RepolensError::CloneFailed { .. } | RepolensError::Timeout { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Clone or timeout error (may be recoverable)"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! clone_failed {
    ($msg:expr, $component:expr) => {
        $crate::RepolensError::CloneFailed {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::RepolensError::CloneFailed {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! traversal_failed {
    ($msg:expr, $component:expr) => {
        $crate::RepolensError::TraversalFailed {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::RepolensError::TraversalFailed {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::RepolensError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::RepolensError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::RepolensError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'repolens config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! invalid_request {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::RepolensError::InvalidRequest {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::RepolensError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Verify the identifier"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_failed_carries_diagnostic() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "repository not found");
        let error = clone_failed!("fatal: repository not found", "fetcher", io);

        assert_eq!(error.category(), "clone_failed");
        assert_eq!(error.http_status(), 500);
        assert!(error.is_recoverable());
        assert!(error.to_string().contains("repository not found"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_request_errors_map_to_client_statuses() {
        let missing = not_found_error!("snapshot 7", "store");
        assert_eq!(missing.http_status(), 404);
        assert!(!missing.is_recoverable());

        let invalid = invalid_request!("unknown analysis kind", "analysis_type", "analyzer");
        assert_eq!(invalid.http_status(), 400);
        match &invalid {
            RepolensError::InvalidRequest { field, context, .. } => {
                assert_eq!(field.as_deref(), Some("analysis_type"));
                assert_eq!(context.component, "analyzer");
                assert!(!context.error_id.is_empty());
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_io_errors_have_no_context() {
        let error = RepolensError::from(std::io::Error::other("disk gone"));
        assert!(error.context().is_none());
        assert_eq!(error.category(), "io");
    }
}

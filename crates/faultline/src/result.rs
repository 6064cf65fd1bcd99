//! Result and error types for Faultline.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for Faultline operations
pub type FaultlineResult<T> = Result<T, FaultlineError>;

/// Errors that can occur while building fault-localization data
///
/// A `Consistency` error is fatal for the buggy version being processed and
/// must never be downgraded; the corpus evaluator records it as a skip.
#[derive(Debug, Error)]
pub enum FaultlineError {
    /// An invariant of the input data does not hold
    #[error("Consistency violation: {message}")]
    Consistency {
        /// Error message
        message: String,
    },

    /// A required input artifact does not exist
    #[error("Missing artifact: {}", path.display())]
    MissingArtifact {
        /// Path that was expected
        path: PathBuf,
    },

    /// An artifact exists but could not be parsed
    #[error("Failed to parse {}:{line}: {message}", path.display())]
    Parse {
        /// Offending file
        path: PathBuf,
        /// 1-based line number (0 when unknown)
        line: usize,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FaultlineError {
    /// Create a consistency error
    #[must_use]
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency {
            message: message.into(),
        }
    }

    /// Create a missing-artifact error
    #[must_use]
    pub fn missing(path: impl AsRef<Path>) -> Self {
        Self::MissingArtifact {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a parse error
    #[must_use]
    pub fn parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is an invariant violation of the version's data
    #[must_use]
    pub const fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency { .. })
    }
}

/// Fail with a consistency error unless `cond` holds
macro_rules! ensure_consistent {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::result::FaultlineError::consistency(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure_consistent;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_error() {
        let err = FaultlineError::consistency("two buggy lines");
        assert!(err.is_consistency());
        assert!(err.to_string().contains("Consistency violation"));
        assert!(err.to_string().contains("two buggy lines"));
    }

    #[test]
    fn test_missing_artifact_error() {
        let err = FaultlineError::missing("/tmp/v1/bug_info.csv");
        assert!(!err.is_consistency());
        assert!(err.to_string().contains("bug_info.csv"));
    }

    #[test]
    fn test_parse_error_location() {
        let err = FaultlineError::parse("results.csv", 7, "bad build result");
        let msg = err.to_string();
        assert!(msg.contains("results.csv:7"));
        assert!(msg.contains("bad build result"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FaultlineError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }

    #[test]
    fn test_ensure_consistent_macro() {
        fn check(n: usize) -> FaultlineResult<()> {
            ensure_consistent!(n == 1, "expected one, got {n}");
            Ok(())
        }
        assert!(check(1).is_ok());
        let err = check(2).unwrap_err();
        assert!(err.to_string().contains("expected one, got 2"));
    }
}

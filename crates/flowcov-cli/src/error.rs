//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// A recorded trace could not be replayed
    #[error("Trace replay failed: {message}")]
    Replay {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// FlowCov library error
    #[error("FlowCov error: {0}")]
    Flowcov(#[from] flowcov::FlowcovError),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML input error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a replay error
    #[must_use]
    pub fn replay(message: impl Into<String>) -> Self {
        Self::Replay {
            message: message.into(),
        }
    }

    /// Whether the failure is a coverage gate rather than a usage problem
    #[must_use]
    pub const fn is_below_minimum(&self) -> bool {
        matches!(
            self,
            Self::Flowcov(flowcov::FlowcovError::CoverageBelowMinimum { .. })
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_replay_error() {
        let err = CliError::replay("no method");
        assert!(err.to_string().contains("replay"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }

    #[test]
    fn test_below_minimum_is_detected() {
        let err: CliError = flowcov::FlowcovError::CoverageBelowMinimum {
            scope: "class A".to_string(),
            actual: 0.2,
            minimum: 0.5,
        }
        .into();
        assert!(err.is_below_minimum());
        assert!(!CliError::invalid_argument("x").is_below_minimum());
    }
}

//! Result and error types for FlowCov.

use thiserror::Error;

/// Result type for FlowCov operations
pub type FlowcovResult<T> = Result<T, FlowcovError>;

/// Errors that can occur in FlowCov
#[derive(Debug, Error)]
pub enum FlowcovError {
    /// An observation or query named a definition that was never registered
    #[error("Unknown definition: no coverage registered for key '{key}'")]
    UnknownDefinition {
        /// Process or decision definition key
        key: String,
    },

    /// An exit notification matched no open flow node record
    #[error(
        "Covered element not found: no open record for '{element_id}' (instance {instance_id}) in '{definition_key}'"
    )]
    ElementNotFound {
        /// Definition key of the element
        definition_key: String,
        /// Declared element id
        element_id: String,
        /// Runtime instance id carried by the exit notification
        instance_id: String,
    },

    /// Test methods of one class deployed different process definitions
    #[error(
        "Class coverage can only be calculated if all tests deploy the same resources: expected [{expected}], method '{method}' deployed [{actual}]"
    )]
    InconsistentDeployment {
        /// Resources deployed by the reference method
        expected: String,
        /// Resources deployed by the offending method
        actual: String,
        /// Offending method name
        method: String,
    },

    /// No coverage registered for the named test method
    #[error("Unknown test method: {method}")]
    UnknownMethod {
        /// Method name
        method: String,
    },

    /// A notification arrived before any test method was selected
    #[error("No current test method set")]
    NoCurrentMethod,

    /// A class-level query ran against a class without method coverage
    #[error("Class coverage contains no test method coverage")]
    EmptyClassCoverage,

    /// The graph snapshot for a definition could not be produced
    #[error("Graph snapshot unavailable for '{definition_id}': {message}")]
    SnapshotUnavailable {
        /// Deployment specific definition id
        definition_id: String,
        /// Error message
        message: String,
    },

    /// A minimum coverage gate failed
    #[error("Coverage of {scope} is {actual:.3}, below the minimum of {minimum:.3}")]
    CoverageBelowMinimum {
        /// What was measured (class, method or definition)
        scope: String,
        /// Measured ratio
        actual: f64,
        /// Required ratio
        minimum: f64,
    },

    /// Configuration values out of range or malformed
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
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

impl FlowcovError {
    /// Create an unknown definition error
    #[must_use]
    pub fn unknown_definition(key: impl Into<String>) -> Self {
        Self::UnknownDefinition { key: key.into() }
    }

    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Whether the error means the observation pipeline is wired incorrectly
    #[must_use]
    pub const fn is_integration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownDefinition { .. }
                | Self::ElementNotFound { .. }
                | Self::UnknownMethod { .. }
                | Self::NoCurrentMethod
        )
    }
}

//! Error types for store and cloud-function operations.
//!
//! Drivers map their internal errors into these variants. Pages turn them
//! into [`ActionError`]s with `?`.

use std::time::Duration;

use switchboard_action::ActionError;

/// Error type for all store and cloud-function operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Record not found.
    #[error("{class_name} not found: {object_id}")]
    NotFound {
        /// Class that was searched.
        class_name: String,
        /// Identifier that was looked up.
        object_id: String,
    },

    /// The record or query is malformed.
    #[error("invalid {0}")]
    Invalid(String),

    /// No cloud function is registered under the name.
    #[error("cloud function not found: {0}")]
    FunctionNotFound(String),

    /// The cloud function ran and reported an error.
    #[error("cloud function '{name}' failed: {message}")]
    Function {
        /// Function name.
        name: String,
        /// Message returned by the function.
        message: String,
    },

    /// Operation exceeded its timeout.
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        /// What was being waited on.
        operation: String,
        /// How long was waited before giving up.
        duration: Duration,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend connection failure.
    #[error("connection error: {0}")]
    Connection(String),
}

impl StoreError {
    /// Convenience constructor for [`StoreError::NotFound`].
    pub fn not_found(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self::NotFound {
            class_name: class_name.into(),
            object_id: object_id.into(),
        }
    }

    /// Convenience constructor for [`StoreError::Timeout`].
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Returns `true` for transient errors a caller may retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<StoreError> for ActionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout {
                operation,
                duration,
            } => ActionError::Timeout {
                operation,
                after: duration,
            },
            StoreError::NotFound { .. } => ActionError::execution(err.to_string()),
            StoreError::Invalid(message) => ActionError::validation(message),
            other => ActionError::store(other.to_string()),
        }
    }
}

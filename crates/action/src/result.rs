//! Uniform result envelope returned by every action.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;

/// Timing and identity attached to every [`ActionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// Wall-clock execution time in milliseconds.
    #[serde(rename = "executionTime")]
    pub execution_time_ms: u64,
    /// When the result was produced.
    pub timestamp: DateTime<Utc>,
    /// Action that produced the result.
    pub action_id: String,
    /// User the action ran for.
    pub user_id: String,
}

impl ResultMetadata {
    /// Metadata stamped with the current time.
    pub fn new(action_id: impl Into<String>, user_id: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            execution_time_ms,
            timestamp: Utc::now(),
            action_id: action_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Outcome of one action invocation.
///
/// Callers branch on [`success`](Self::success); on failure
/// [`error`](Self::error) holds a message fit for direct display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action succeeded.
    pub success: bool,
    /// Payload returned by the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Human-readable success message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Human-readable failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Timing and identity.
    pub metadata: ResultMetadata,
}

impl ActionResult {
    /// Successful result.
    pub fn success(
        data: serde_json::Value,
        message: impl Into<String>,
        metadata: ResultMetadata,
    ) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
            metadata,
        }
    }

    /// Failed result carrying a message.
    pub fn failure(error: impl Into<String>, metadata: ResultMetadata) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
            metadata,
        }
    }

    /// Failed result rendered from an [`ActionError`].
    pub fn from_error(error: &ActionError, metadata: ResultMetadata) -> Self {
        Self::failure(error.to_string(), metadata)
    }

    /// Returns `true` if the action succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Deserialize the payload into `T`.
    ///
    /// Returns `None` for failures, missing payloads, or shape mismatches.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.data
            .clone()
            .and_then(|data| serde_json::from_value(data).ok())
    }
}

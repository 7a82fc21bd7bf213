//! Cloud function port and the timeout helper.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Remote function runtime.
#[async_trait]
pub trait CloudFunctions: Send + Sync {
    /// Run `name` with `payload` and return its output.
    async fn run(&self, name: &str, payload: Value) -> Result<Value, StoreError>;
}

/// Await `future`, failing with [`StoreError::Timeout`] after `limit`.
pub async fn with_timeout<T, F>(
    operation: impl Into<String>,
    limit: Duration,
    future: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            let operation = operation.into();
            tracing::warn!(%operation, limit_ms = limit.as_millis() as u64, "operation timed out");
            Err(StoreError::timeout(operation, limit))
        }
    }
}

/// Run one cloud function with a time limit.
///
/// The timeout error reads `"Cloud function '<name>' timed out after <ms>ms"`
/// once converted into an `ActionError`.
pub async fn run_with_timeout(
    functions: &dyn CloudFunctions,
    name: &str,
    payload: Value,
    limit: Duration,
) -> Result<Value, StoreError> {
    with_timeout(
        format!("Cloud function '{name}'"),
        limit,
        functions.run(name, payload),
    )
    .await
}

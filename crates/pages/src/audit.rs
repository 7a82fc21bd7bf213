//! Audit sink writing events to the object store.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use switchboard_store::{ObjectStore, Record, fields};
use switchboard_telemetry::{ActionEvent, AuditError, AuditSink};

/// Record class of persisted audit events.
pub const AUDIT_CLASS: &str = "AuditLog";

/// [`AuditSink`] that saves each event as an `AuditLog` record.
///
/// Events are stamped with the caller's organization, when the call had
/// one, so they stay visible to tenant-scoped queries.
pub struct StoreAuditSink {
    store: Arc<dyn ObjectStore>,
}

impl StoreAuditSink {
    /// Sink writing to `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    fn to_record(event: &ActionEvent) -> Record {
        let mut record = Record::new(AUDIT_CLASS)
            .with_field("eventId", event.event_id.to_string())
            .with_field("kind", event.kind.as_str())
            .with_field("actionId", event.action_id.as_str())
            .with_field("pageId", event.page_id.as_str())
            .with_field("userId", event.user_id.as_str())
            .with_field("userRoles", event.data.user_roles.clone())
            .with_field("params", Value::Object(event.data.params.clone()))
            .with_field("timestamp", event.timestamp.to_rfc3339());
        if let Some(organization_id) = &event.data.organization_id {
            record.set(fields::ORGANIZATION_ID, organization_id.as_str());
        }
        if let Some(error) = &event.error {
            record.set("error", error.as_str());
        }
        record
    }
}

impl std::fmt::Debug for StoreAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAuditSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuditSink for StoreAuditSink {
    async fn record(&self, event: &ActionEvent) -> Result<(), AuditError> {
        self.store
            .save(Self::to_record(event))
            .await
            .map(|_| ())
            .map_err(|e| AuditError::Sink(e.to_string()))
    }
}

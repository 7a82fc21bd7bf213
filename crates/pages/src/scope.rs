//! Tenant scoping shared by every page.

use serde::Deserialize;
use serde_json::Value;
use switchboard_action::{ActionContext, ActionError};
use switchboard_store::{ObjectStore, Query, Record, StoreError, fields};

/// Parameters of actions that take none.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct NoParams {}

/// Organization id of the caller.
pub(crate) fn organization_id(context: &ActionContext) -> Result<String, ActionError> {
    context
        .organization_id()
        .map(str::to_owned)
        .ok_or(ActionError::OrganizationRequired)
}

/// Query over `class_name` limited to the caller's organization.
pub(crate) fn scoped(class_name: &str, organization_id: &str) -> Query {
    Query::new(class_name).equal_to(fields::ORGANIZATION_ID, organization_id)
}

/// Load a record, hiding records that belong to another organization.
pub(crate) async fn load_owned(
    store: &dyn ObjectStore,
    class_name: &str,
    object_id: &str,
    organization_id: &str,
) -> Result<Record, ActionError> {
    let record = store.get(class_name, object_id).await?;
    if record.organization_id() != Some(organization_id) {
        return Err(StoreError::not_found(class_name, object_id).into());
    }
    Ok(record)
}

/// New record stamped with the caller's organization.
pub(crate) fn owned_record(class_name: &str, organization_id: &str) -> Record {
    Record::new(class_name).with_field(fields::ORGANIZATION_ID, organization_id)
}

/// JSON array of records.
pub(crate) fn to_json(records: &[Record]) -> Value {
    Value::Array(records.iter().map(Record::to_json).collect())
}

/// Reject empty strings after trimming.
pub(crate) fn non_empty<'a>(name: &str, value: &'a str) -> Result<&'a str, ActionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ActionError::validation(format!("{name} is required")));
    }
    Ok(trimmed)
}

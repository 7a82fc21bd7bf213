//! Generic data browser over any record class.

use serde::Deserialize;
use serde_json::{Value, json};
use switchboard_action::{
    ActionCategory, ActionContext, ActionError, ActionMetadata, ActionParameter, ValidationRule,
};
use switchboard_controller::{PageConfig, PageController};
use switchboard_core::JsonMap;
use switchboard_store::{Query, Record, fields};
use switchboard_telemetry::Instrumentation;

use crate::audit::AUDIT_CLASS;
use crate::scope::{load_owned, organization_id, owned_record, scoped, to_json};
use crate::services::{PageServices, bind, register};
use crate::{functions, notifications, reports, workflows};

/// Page id.
pub const PAGE_ID: &str = "objects";

/// Classes owned by other pages. The generic browser neither reads nor
/// writes them, so their own permissions and validation always apply.
pub const SYSTEM_CLASSES: [&str; 6] = [
    AUDIT_CLASS,
    functions::CLASS,
    notifications::CLASS,
    reports::CLASS,
    workflows::CLASS,
    workflows::RUN_CLASS,
];

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// Build the objects page.
pub fn objects_page(services: &PageServices, instrumentation: Instrumentation) -> PageController {
    let page = PageController::new(
        PageConfig::new(PAGE_ID, "Objects")
            .describe("Browse and edit records of any class")
            .with_category("data")
            .with_permission("objects:read"),
        instrumentation,
    );

    register(
        &page,
        ActionMetadata::new("objects.list", "List Objects", "List records of a class with optional filters")
            .with_category(ActionCategory::Data)
            .with_permission("objects:read")
            .with_parameter(class_name_param())
            .with_parameter(ActionParameter::object("where").describe("Field values records must equal"))
            .with_parameter(
                ActionParameter::integer("limit")
                    .describe("Maximum number of records")
                    .range(1.0, MAX_LIMIT as f64),
            )
            .with_parameter(ActionParameter::integer("skip").describe("Records to skip"))
            .with_parameter(
                ActionParameter::string("orderBy")
                    .describe("Sort field, prefix with '-' for descending"),
            )
            .with_tag("objects")
            .with_example("First ten customers", json!({"className": "Customer", "limit": 10})),
        bind(services, list),
    );

    register(
        &page,
        ActionMetadata::new("objects.get", "Get Object", "Fetch one record by id")
            .with_category(ActionCategory::Data)
            .with_permission("objects:read")
            .with_parameter(class_name_param())
            .with_parameter(ActionParameter::string("objectId").required().describe("Record id")),
        bind(services, get),
    );

    register(
        &page,
        ActionMetadata::new("objects.create", "Create Object", "Create a record in the current organization")
            .with_category(ActionCategory::Data)
            .with_permission("objects:write")
            .with_parameter(class_name_param())
            .with_parameter(ActionParameter::object("fields").required().describe("Field values")),
        bind(services, create),
    );

    register(
        &page,
        ActionMetadata::new("objects.update", "Update Object", "Change fields of an existing record")
            .with_category(ActionCategory::Data)
            .with_permission("objects:write")
            .with_parameter(class_name_param())
            .with_parameter(ActionParameter::string("objectId").required().describe("Record id"))
            .with_parameter(ActionParameter::object("fields").required().describe("Fields to change")),
        bind(services, update),
    );

    register(
        &page,
        ActionMetadata::new("objects.delete", "Delete Object", "Delete a record")
            .with_category(ActionCategory::Data)
            .with_permission("objects:delete")
            .with_parameter(class_name_param())
            .with_parameter(ActionParameter::string("objectId").required().describe("Record id")),
        bind(services, delete),
    );

    register(
        &page,
        ActionMetadata::new("objects.count", "Count Objects", "Count records of a class")
            .with_category(ActionCategory::Data)
            .with_permission("objects:read")
            .with_parameter(class_name_param())
            .with_parameter(ActionParameter::object("where").describe("Field values records must equal")),
        bind(services, count),
    );

    page
}

fn class_name_param() -> ActionParameter {
    ActionParameter::string("className")
        .required()
        .describe("Record class, e.g. Customer")
        .with_validation(ValidationRule {
            pattern: Some("^[A-Za-z][A-Za-z0-9_]*$".into()),
            max_length: Some(64),
            ..ValidationRule::default()
        })
}

fn browsable(class_name: &str) -> Result<(), ActionError> {
    if SYSTEM_CLASSES.contains(&class_name) {
        return Err(ActionError::validation(format!(
            "Class '{class_name}' is managed by the console and cannot be accessed from the objects page"
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    class_name: String,
    #[serde(default, rename = "where")]
    filter: JsonMap,
    limit: Option<usize>,
    #[serde(default)]
    skip: usize,
    order_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountParams {
    class_name: String,
    #[serde(default, rename = "where")]
    filter: JsonMap,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectRef {
    class_name: String,
    object_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateParams {
    class_name: String,
    fields: JsonMap,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParams {
    class_name: String,
    object_id: String,
    fields: JsonMap,
}

/// Tenant-scoped query with equality filters. The organization filter
/// cannot be overridden from `where`.
fn filtered(class_name: &str, organization_id: &str, filter: &JsonMap) -> Query {
    filter
        .iter()
        .filter(|(field, _)| field.as_str() != fields::ORGANIZATION_ID)
        .fold(scoped(class_name, organization_id), |query, (field, value)| {
            query.equal_to(field.clone(), value.clone())
        })
}

fn writable(input: &JsonMap) -> JsonMap {
    input
        .iter()
        .filter(|(name, _)| name.as_str() != fields::ORGANIZATION_ID)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

async fn list(services: PageServices, p: ListParams, ctx: ActionContext) -> Result<Value, ActionError> {
    browsable(&p.class_name)?;
    let org = organization_id(&ctx)?;
    let mut query = filtered(&p.class_name, &org, &p.filter);
    let total = services.store.count(&query).await?;

    if let Some(order) = p.order_by.as_deref() {
        query = match order.strip_prefix('-') {
            Some(field) => query.descending(field),
            None => query.ascending(order),
        };
    }
    let limit = p.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let records = services.store.find(&query.skip(p.skip).limit(limit)).await?;

    Ok(json!({
        "className": p.class_name,
        "results": to_json(&records),
        "count": total,
    }))
}

async fn get(services: PageServices, p: ObjectRef, ctx: ActionContext) -> Result<Value, ActionError> {
    browsable(&p.class_name)?;
    let org = organization_id(&ctx)?;
    let record = load_owned(services.store.as_ref(), &p.class_name, &p.object_id, &org).await?;
    Ok(record.to_json())
}

async fn create(services: PageServices, p: CreateParams, ctx: ActionContext) -> Result<Value, ActionError> {
    browsable(&p.class_name)?;
    let org = organization_id(&ctx)?;
    let mut record = owned_record(&p.class_name, &org);
    record.merge(&writable(&p.fields));
    let saved = services.store.save(record).await?;
    tracing::info!(class_name = %p.class_name, object_id = ?saved.object_id, "object created");
    Ok(saved.to_json())
}

async fn update(services: PageServices, p: UpdateParams, ctx: ActionContext) -> Result<Value, ActionError> {
    browsable(&p.class_name)?;
    let org = organization_id(&ctx)?;
    load_owned(services.store.as_ref(), &p.class_name, &p.object_id, &org).await?;

    let mut changes = Record::with_id(&p.class_name, &p.object_id);
    changes.merge(&writable(&p.fields));
    let saved = services.store.save(changes).await?;
    Ok(saved.to_json())
}

async fn delete(services: PageServices, p: ObjectRef, ctx: ActionContext) -> Result<Value, ActionError> {
    browsable(&p.class_name)?;
    let org = organization_id(&ctx)?;
    load_owned(services.store.as_ref(), &p.class_name, &p.object_id, &org).await?;
    let deleted = services.store.destroy(&p.class_name, &p.object_id).await?;
    Ok(json!({ "objectId": p.object_id, "deleted": deleted }))
}

async fn count(services: PageServices, p: CountParams, ctx: ActionContext) -> Result<Value, ActionError> {
    browsable(&p.class_name)?;
    let org = organization_id(&ctx)?;
    let count = services.store.count(&filtered(&p.class_name, &org, &p.filter)).await?;
    Ok(json!({ "className": p.class_name, "count": count }))
}

//! Saved reports and group-by aggregation over records.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Value, json};
use switchboard_action::{
    ActionCategory, ActionContext, ActionError, ActionMetadata, ActionParameter,
};
use switchboard_controller::{PageConfig, PageController};
use switchboard_core::JsonMap;
use switchboard_store::{ObjectStore, Record, fields};
use switchboard_telemetry::Instrumentation;

use crate::scope::{NoParams, load_owned, non_empty, organization_id, owned_record, scoped, to_json};
use crate::services::{PageServices, bind, register};

/// Page id.
pub const PAGE_ID: &str = "reports";

/// Record class.
pub const CLASS: &str = "Report";

/// Build the reports page.
pub fn reports_page(services: &PageServices, instrumentation: Instrumentation) -> PageController {
    let page = PageController::new(
        PageConfig::new(PAGE_ID, "Reports")
            .describe("Group-by counts over records, saved for reuse")
            .with_category("data")
            .with_permission("reports:read"),
        instrumentation,
    );

    register(
        &page,
        ActionMetadata::new("reports.list", "List Reports", "Saved report definitions")
            .with_category(ActionCategory::Data)
            .with_permission("reports:read"),
        bind(services, list),
    );

    register(
        &page,
        ActionMetadata::new("reports.generate", "Generate Report", "Count records grouped by a field")
            .with_category(ActionCategory::Data)
            .with_permission("reports:read")
            .with_parameter(ActionParameter::string("reportId").describe("Saved report to run"))
            .with_parameter(ActionParameter::string("className").describe("Record class to aggregate"))
            .with_parameter(ActionParameter::string("groupBy").describe("Field to group by"))
            .with_parameter(ActionParameter::object("where").describe("Field values records must equal"))
            .with_example(
                "Customers by tier",
                json!({"className": "Customer", "groupBy": "tier"}),
            ),
        bind(services, generate),
    );

    register(
        &page,
        ActionMetadata::new("reports.save", "Save Report", "Save a report definition")
            .with_category(ActionCategory::Data)
            .with_permission("reports:write")
            .with_parameter(ActionParameter::string("name").required().describe("Report name"))
            .with_parameter(ActionParameter::string("className").required().describe("Record class"))
            .with_parameter(ActionParameter::string("groupBy").required().describe("Field to group by"))
            .with_parameter(ActionParameter::object("where").describe("Field values records must equal")),
        bind(services, save),
    );

    page
}

/// What to aggregate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Definition {
    class_name: String,
    group_by: String,
    #[serde(default, rename = "where")]
    filter: JsonMap,
}

impl Definition {
    /// `className` is reserved on records, so the target class is stored
    /// as `targetClass`.
    fn from_record(record: &Record) -> Result<Self, ActionError> {
        let field = |name: &str| {
            record
                .get_str(name)
                .map(str::to_owned)
                .ok_or_else(|| ActionError::execution(format!("report definition is missing {name}")))
        };
        Ok(Self {
            class_name: field("targetClass")?,
            group_by: field("groupBy")?,
            filter: record
                .fields
                .get("where")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

async fn list(services: PageServices, _: NoParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let records = services.store.find(&scoped(CLASS, &org).ascending("name")).await?;
    Ok(json!({ "results": to_json(&records), "count": records.len() }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateParams {
    report_id: Option<String>,
    class_name: Option<String>,
    group_by: Option<String>,
    #[serde(default, rename = "where")]
    filter: JsonMap,
}

async fn generate(services: PageServices, p: GenerateParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let store = services.store.as_ref();

    let definition = match (p.report_id, p.class_name, p.group_by) {
        (Some(id), _, _) => Definition::from_record(&load_owned(store, CLASS, &id, &org).await?)?,
        (None, Some(class_name), Some(group_by)) => Definition {
            class_name,
            group_by,
            filter: p.filter,
        },
        _ => {
            return Err(ActionError::validation("reportId or className with groupBy is required"));
        }
    };

    aggregate(store, &org, &definition).await
}

async fn aggregate(store: &dyn ObjectStore, org: &str, definition: &Definition) -> Result<Value, ActionError> {
    let query = definition
        .filter
        .iter()
        .filter(|(field, _)| field.as_str() != fields::ORGANIZATION_ID)
        .fold(scoped(&definition.class_name, org), |query, (field, value)| {
            query.equal_to(field.clone(), value.clone())
        });
    let records = store.find(&query).await?;

    let mut groups: IndexMap<String, (Value, usize)> = IndexMap::new();
    for record in &records {
        let value = record.get(&definition.group_by).unwrap_or(Value::Null);
        groups.entry(value.to_string()).or_insert((value, 0)).1 += 1;
    }
    let mut rows: Vec<(Value, usize)> = groups.into_values().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(json!({
        "className": definition.class_name,
        "groupBy": definition.group_by,
        "total": records.len(),
        "rows": rows
            .into_iter()
            .map(|(value, count)| json!({ "value": value, "count": count }))
            .collect::<Vec<_>>(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveParams {
    name: String,
    #[serde(flatten)]
    definition: Definition,
}

async fn save(services: PageServices, p: SaveParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let name = non_empty("name", &p.name)?;

    let existing = services
        .store
        .count(&scoped(CLASS, &org).equal_to("name", name))
        .await?;
    if existing > 0 {
        return Err(ActionError::validation(format!("a report named '{name}' already exists")));
    }

    let record = owned_record(CLASS, &org)
        .with_field("name", name)
        .with_field("targetClass", p.definition.class_name.as_str())
        .with_field("groupBy", p.definition.group_by.as_str())
        .with_field("where", Value::Object(p.definition.filter))
        .with_field("createdBy", ctx.user.id.as_str());
    Ok(services.store.save(record).await?.to_json())
}

//! Workflows: named, switchable triggers for a cloud function.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use switchboard_action::{
    ActionCategory, ActionContext, ActionError, ActionMetadata, ActionParameter,
};
use switchboard_controller::{PageConfig, PageController};
use switchboard_store::Record;
use switchboard_telemetry::Instrumentation;

use crate::functions;
use crate::scope::{load_owned, non_empty, organization_id, owned_record, scoped, to_json};
use crate::services::{PageServices, bind, register};

/// Page id.
pub const PAGE_ID: &str = "workflows";

/// Record class.
pub const CLASS: &str = "Workflow";

/// Record class of run history entries.
pub const RUN_CLASS: &str = "WorkflowRun";

/// Build the workflows page.
pub fn workflows_page(services: &PageServices, instrumentation: Instrumentation) -> PageController {
    let page = PageController::new(
        PageConfig::new(PAGE_ID, "Workflows")
            .describe("Automations that run a cloud function on demand")
            .with_category("automation")
            .with_permission("workflows:read"),
        instrumentation,
    );

    register(
        &page,
        ActionMetadata::new("workflows.list", "List Workflows", "Workflows of the organization")
            .with_category(ActionCategory::Data)
            .with_permission("workflows:read")
            .with_parameter(ActionParameter::boolean("active").describe("Only active or only inactive workflows")),
        bind(services, list),
    );

    register(
        &page,
        ActionMetadata::new("workflows.create", "Create Workflow", "Create an inactive workflow")
            .with_category(ActionCategory::Data)
            .with_permission("workflows:write")
            .with_parameter(ActionParameter::string("name").required().describe("Workflow name"))
            .with_parameter(ActionParameter::string("functionName").required().describe("Function the workflow runs"))
            .with_parameter(ActionParameter::string("description").describe("What the workflow does")),
        bind(services, create),
    );

    register(
        &page,
        ActionMetadata::new("workflows.set_active", "Activate Workflow", "Turn a workflow on or off")
            .with_category(ActionCategory::Data)
            .with_permission("workflows:write")
            .with_parameter(ActionParameter::string("workflowId").required().describe("Workflow id"))
            .with_parameter(ActionParameter::boolean("active").required().describe("New state")),
        bind(services, set_active),
    );

    register(
        &page,
        ActionMetadata::new("workflows.run", "Run Workflow", "Run an active workflow now")
            .with_category(ActionCategory::External)
            .with_permission("workflows:execute")
            .with_parameter(ActionParameter::string("workflowId").required().describe("Workflow id"))
            .with_parameter(ActionParameter::object("input").describe("Input passed to the function")),
        bind(services, run),
    );

    page
}

#[derive(Debug, Deserialize)]
struct ListParams {
    active: Option<bool>,
}

async fn list(services: PageServices, p: ListParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let mut query = scoped(CLASS, &org).ascending("name");
    if let Some(active) = p.active {
        query = query.equal_to("active", active);
    }
    let records = services.store.find(&query).await?;
    Ok(json!({ "results": to_json(&records), "count": records.len() }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateParams {
    name: String,
    function_name: String,
    #[serde(default)]
    description: String,
}

async fn create(services: PageServices, p: CreateParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let record = owned_record(CLASS, &org)
        .with_field("name", non_empty("name", &p.name)?)
        .with_field("functionName", non_empty("functionName", &p.function_name)?)
        .with_field("description", p.description.as_str())
        .with_field("active", false)
        .with_field("runCount", 0)
        .with_field("createdBy", ctx.user.id.as_str());
    Ok(services.store.save(record).await?.to_json())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetActive {
    workflow_id: String,
    active: bool,
}

async fn set_active(services: PageServices, p: SetActive, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    load_owned(services.store.as_ref(), CLASS, &p.workflow_id, &org).await?;
    let saved = services
        .store
        .save(Record::with_id(CLASS, &p.workflow_id).with_field("active", p.active))
        .await?;
    tracing::info!(workflow_id = %p.workflow_id, active = p.active, "workflow toggled");
    Ok(saved.to_json())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunParams {
    workflow_id: String,
    #[serde(default)]
    input: Value,
}

async fn run(services: PageServices, p: RunParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let store = services.store.as_ref();
    let workflow = load_owned(store, CLASS, &p.workflow_id, &org).await?;

    if workflow.get("active") != Some(Value::Bool(true)) {
        return Err(ActionError::execution(format!(
            "Workflow '{}' is not active",
            workflow.get_str("name").unwrap_or(&p.workflow_id)
        )));
    }
    let function_name = workflow
        .get_str("functionName")
        .ok_or_else(|| ActionError::execution("Workflow has no function"))?
        .to_owned();

    let outcome = functions::invoke(&services, &org, &ctx.user.id, &function_name, p.input).await;

    let status = if outcome.is_ok() { "succeeded" } else { "failed" };
    let mut history = owned_record(RUN_CLASS, &org)
        .with_field("workflowId", p.workflow_id.as_str())
        .with_field("status", status)
        .with_field("startedBy", ctx.user.id.as_str());
    if let Err(error) = &outcome {
        history.set("error", error.to_string());
    }
    store.save(history).await?;

    store
        .save(
            Record::with_id(CLASS, &p.workflow_id)
                .with_field("lastRunAt", Utc::now().to_rfc3339())
                .with_field("lastStatus", status),
        )
        .await?;
    store.increment(CLASS, &p.workflow_id, "runCount", 1).await?;

    let output = outcome?;
    Ok(json!({ "workflowId": p.workflow_id, "status": status, "output": output }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use pretty_assertions::assert_eq;
    use switchboard_action::{Action, ActionParams};
    use switchboard_core::UserContext;
    use switchboard_store::{MemoryStore, ObjectStore, Query, StoreError};

    fn params(value: Value) -> ActionParams {
        match value {
            Value::Object(map) => map,
            _ => ActionParams::new(),
        }
    }

    fn ctx() -> ActionContext {
        ActionContext::new(UserContext::new("u-1").with_organization("org-1"))
    }

    fn setup() -> (PageController, Arc<MemoryStore>) {
        let (services, store, functions) = PageServices::in_memory();
        functions.register("double", |request: Value| async move {
            let n = request["params"]["n"].as_i64().unwrap_or(0);
            Ok::<_, StoreError>(json!({ "n": n * 2 }))
        });
        functions.register("fail", |_| async {
            Err::<Value, _>(StoreError::Function {
                name: "fail".into(),
                message: "bad input".into(),
            })
        });
        for name in ["double", "fail"] {
            store.insert(owned_record(functions::CLASS, "org-1").with_field("name", name));
        }
        (workflows_page(&services, Instrumentation::default()), store)
    }

    async fn create(page: &PageController, function_name: &str) -> String {
        let created = page
            .action("workflows.create")
            .unwrap()
            .execute(params(json!({"name": function_name, "functionName": function_name})), ctx())
            .await;
        created.data.unwrap()["objectId"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn inactive_workflows_do_not_run() {
        let (page, _) = setup();
        let id = create(&page, "double").await;

        let result = page
            .action("workflows.run")
            .unwrap()
            .execute(params(json!({"workflowId": id})), ctx())
            .await;
        assert_eq!(result.error.as_deref(), Some("Workflow 'double' is not active"));
    }

    #[tokio::test]
    async fn active_workflow_runs_and_records_history() {
        let (page, store) = setup();
        let id = create(&page, "double").await;
        let toggled = page
            .action("workflows.set_active")
            .unwrap()
            .execute(params(json!({"workflowId": id, "active": true})), ctx())
            .await;
        assert!(toggled.success);

        let result = page
            .action("workflows.run")
            .unwrap()
            .execute(params(json!({"workflowId": id, "input": {"n": 21}})), ctx())
            .await;
        assert_eq!(
            result.data,
            Some(json!({"workflowId": id, "status": "succeeded", "output": {"n": 42}}))
        );

        let workflow = store.get(CLASS, &id).await.unwrap();
        assert_eq!(workflow.get("runCount"), Some(json!(1)));
        assert_eq!(store.len(RUN_CLASS), 1);
    }

    #[tokio::test]
    async fn failed_runs_are_recorded() {
        let (page, store) = setup();
        let id = create(&page, "fail").await;
        page.action("workflows.set_active")
            .unwrap()
            .execute(params(json!({"workflowId": id, "active": true})), ctx())
            .await;

        let result = page
            .action("workflows.run")
            .unwrap()
            .execute(params(json!({"workflowId": id})), ctx())
            .await;
        assert_eq!(
            result.error.as_deref(),
            Some("Store error: cloud function 'fail' failed: bad input")
        );

        let runs = store
            .find(&Query::new(RUN_CLASS).equal_to("status", "failed"))
            .await
            .unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(store.get(CLASS, &id).await.unwrap().get_str("lastStatus"), Some("failed"));
    }

    #[tokio::test]
    async fn list_filters_by_state() {
        let (page, _) = setup();
        let id = create(&page, "double").await;
        create(&page, "fail").await;
        page.action("workflows.set_active")
            .unwrap()
            .execute(params(json!({"workflowId": id, "active": true})), ctx())
            .await;

        let active = page
            .action("workflows.list")
            .unwrap()
            .execute(params(json!({"active": true})), ctx())
            .await;
        assert_eq!(active.data.unwrap()["count"], json!(1));
    }
}

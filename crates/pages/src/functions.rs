//! Cloud function definitions and invocation.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use switchboard_action::{
    ActionCategory, ActionContext, ActionError, ActionMetadata, ActionParameter, ValidationRule,
};
use switchboard_controller::{PageConfig, PageController};
use switchboard_store::{Record, run_with_timeout};
use switchboard_telemetry::Instrumentation;

use crate::scope::{NoParams, organization_id, owned_record, scoped, to_json};
use crate::services::{PageServices, bind, register};

/// Page id.
pub const PAGE_ID: &str = "functions";

/// Record class.
pub const CLASS: &str = "CloudFunction";

/// Upper bound for a per-function timeout.
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Build the functions page.
pub fn functions_page(services: &PageServices, instrumentation: Instrumentation) -> PageController {
    let page = PageController::new(
        PageConfig::new(PAGE_ID, "Cloud Functions")
            .describe("Register and invoke server-side functions")
            .with_category("automation")
            .with_permission("functions:read"),
        instrumentation,
    );

    register(
        &page,
        ActionMetadata::new("functions.list", "List Functions", "Functions registered for the organization")
            .with_category(ActionCategory::Data)
            .with_permission("functions:read"),
        bind(services, list),
    );

    register(
        &page,
        ActionMetadata::new("functions.register", "Register Function", "Make a function callable from the console")
            .with_category(ActionCategory::Data)
            .with_permission("functions:write")
            .with_parameter(
                ActionParameter::string("name")
                    .required()
                    .describe("Function name")
                    .with_validation(ValidationRule {
                        pattern: Some("^[A-Za-z][A-Za-z0-9_]*$".into()),
                        max_length: Some(64),
                        ..ValidationRule::default()
                    }),
            )
            .with_parameter(ActionParameter::string("description").describe("What the function does"))
            .with_parameter(
                ActionParameter::integer("timeoutMs")
                    .describe("Time limit per call")
                    .range(1.0, MAX_TIMEOUT_MS as f64),
            ),
        bind(services, register_function),
    );

    register(
        &page,
        ActionMetadata::new("functions.invoke", "Invoke Function", "Run a registered function")
            .with_category(ActionCategory::External)
            .with_permission("functions:execute")
            .with_parameter(ActionParameter::string("name").required().describe("Function name"))
            .with_parameter(ActionParameter::object("payload").describe("Arguments for the function"))
            .with_example("Recalculate totals", json!({"name": "recalculate", "payload": {"full": true}})),
        bind(services, invoke_function),
    );

    page
}

async fn list(services: PageServices, _: NoParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let records = services.store.find(&scoped(CLASS, &org).ascending("name")).await?;
    Ok(json!({ "results": to_json(&records), "count": records.len() }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterParams {
    name: String,
    #[serde(default)]
    description: String,
    timeout_ms: Option<u64>,
}

async fn register_function(
    services: PageServices,
    p: RegisterParams,
    ctx: ActionContext,
) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    if definition(&services, &org, &p.name).await?.is_some() {
        return Err(ActionError::validation(format!(
            "Cloud function '{}' is already registered",
            p.name
        )));
    }

    let mut record = owned_record(CLASS, &org)
        .with_field("name", p.name.as_str())
        .with_field("description", p.description.as_str())
        .with_field("invocations", 0);
    if let Some(timeout_ms) = p.timeout_ms {
        record.set("timeoutMs", timeout_ms);
    }
    let saved = services.store.save(record).await?;
    tracing::info!(function = %p.name, organization_id = %org, "cloud function registered");
    Ok(saved.to_json())
}

#[derive(Debug, Deserialize)]
struct InvokeParams {
    name: String,
    #[serde(default)]
    payload: Value,
}

async fn invoke_function(services: PageServices, p: InvokeParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let output = invoke(&services, &org, &ctx.user.id, &p.name, p.payload).await?;
    Ok(json!({ "name": p.name, "output": output }))
}

async fn definition(services: &PageServices, org: &str, name: &str) -> Result<Option<Record>, ActionError> {
    Ok(services
        .store
        .first(&scoped(CLASS, org).equal_to("name", name))
        .await?)
}

/// Run a function registered for `org` under its own time limit.
pub(crate) async fn invoke(
    services: &PageServices,
    org: &str,
    user_id: &str,
    name: &str,
    payload: Value,
) -> Result<Value, ActionError> {
    let record = definition(services, org, name)
        .await?
        .ok_or_else(|| ActionError::execution(format!("Cloud function '{name}' is not registered")))?;
    let limit = record
        .get("timeoutMs")
        .and_then(|v| v.as_u64())
        .map_or(services.function_timeout, |ms| {
            Duration::from_millis(ms.clamp(1, MAX_TIMEOUT_MS))
        });

    let request = json!({
        "organizationId": org,
        "userId": user_id,
        "params": payload,
    });
    let output = run_with_timeout(services.functions.as_ref(), name, request, limit).await?;

    if let Some(object_id) = record.object_id.as_deref() {
        services
            .store
            .save(
                Record::with_id(CLASS, object_id)
                    .with_field("lastInvokedAt", chrono::Utc::now().to_rfc3339()),
            )
            .await?;
        services.store.increment(CLASS, object_id, "invocations", 1).await?;
    }
    Ok(output)
}

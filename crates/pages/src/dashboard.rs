//! Landing page: tenant summary and navigation.

use serde::Deserialize;
use serde_json::{Value, json};
use switchboard_action::{
    ActionCategory, ActionContext, ActionError, ActionMetadata, ActionParameter,
};
use switchboard_controller::{PageConfig, PageController};
use switchboard_telemetry::Instrumentation;

use crate::scope::{NoParams, organization_id, scoped};
use crate::services::{PageServices, bind, register};
use crate::{functions, notifications, reports, workflows};

/// Page id.
pub const PAGE_ID: &str = "dashboard";

/// Pages `dashboard.open_page` can navigate to.
pub const NAVIGABLE_PAGES: [&str; 6] = [
    PAGE_ID,
    crate::objects::PAGE_ID,
    reports::PAGE_ID,
    workflows::PAGE_ID,
    functions::PAGE_ID,
    notifications::PAGE_ID,
];

/// Build the dashboard page.
pub fn dashboard_page(services: &PageServices, instrumentation: Instrumentation) -> PageController {
    let page = PageController::new(
        PageConfig::new(PAGE_ID, "Dashboard")
            .describe("Overview of the current organization")
            .with_category("overview")
            .with_permission("dashboard:read"),
        instrumentation,
    );

    register(
        &page,
        ActionMetadata::new("dashboard.summary", "Dashboard Summary", "Counts of workflows, functions, reports and unread notifications")
            .with_category(ActionCategory::Data)
            .with_permission("dashboard:read")
            .with_tag("overview"),
        bind(services, summary),
    );

    register(
        &page,
        ActionMetadata::new("dashboard.open_page", "Open Page", "Navigate the console to another page")
            .with_category(ActionCategory::Navigation)
            .with_permission("dashboard:read")
            .with_organization_required(false)
            .with_parameter(
                ActionParameter::string("page")
                    .required()
                    .describe("Page to open")
                    .one_of(NAVIGABLE_PAGES),
            )
            .with_parameter(
                ActionParameter::string("className").describe("Record class, when opening the objects page"),
            )
            .with_example("Open workflows", json!({"page": "workflows"})),
        bind(services, open_page),
    );

    page
}

async fn summary(services: PageServices, _: NoParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let store = services.store.as_ref();

    let workflows = store.count(&scoped(workflows::CLASS, &org)).await?;
    let active = store
        .count(&scoped(workflows::CLASS, &org).equal_to("active", true))
        .await?;
    let functions = store.count(&scoped(functions::CLASS, &org)).await?;
    let reports = store.count(&scoped(reports::CLASS, &org)).await?;
    let unread = store
        .count(&notifications::unread_for(&org, &ctx.user.id))
        .await?;

    Ok(json!({
        "organizationId": org,
        "workflows": { "total": workflows, "active": active },
        "functions": functions,
        "reports": reports,
        "unreadNotifications": unread,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenPage {
    page: String,
    class_name: Option<String>,
}

async fn open_page(_: PageServices, p: OpenPage, _: ActionContext) -> Result<Value, ActionError> {
    let path = match (p.page.as_str(), p.class_name) {
        (page, Some(class_name)) if page == crate::objects::PAGE_ID => format!("/{page}/{class_name}"),
        (page, _) if page == PAGE_ID => "/".to_owned(),
        (page, _) => format!("/{page}"),
    };
    Ok(json!({ "path": path }))
}

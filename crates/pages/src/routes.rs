//! Console routes and page mounting.

use std::sync::Arc;

use switchboard_controller::{ControllerRegistry, PageController, RegistryError, RouteTable};

use crate::services::PageServices;
use crate::{dashboard, functions, notifications, objects, reports, workflows};

/// Routes of the standard console pages.
pub fn standard_routes() -> Result<RouteTable, RegistryError> {
    RouteTable::new()
        .with_route("/", dashboard::PAGE_ID)?
        .with_route("/dashboard", dashboard::PAGE_ID)?
        .with_route("/objects", objects::PAGE_ID)?
        .with_route("/objects/:className", objects::PAGE_ID)?
        .with_route("/objects/:className/:objectId", objects::PAGE_ID)?
        .with_route("/reports", reports::PAGE_ID)?
        .with_route("/reports/:reportId", reports::PAGE_ID)?
        .with_route("/workflows", workflows::PAGE_ID)?
        .with_route("/workflows/:workflowId", workflows::PAGE_ID)?
        .with_route("/functions", functions::PAGE_ID)?
        .with_route("/functions/:name", functions::PAGE_ID)?
        .with_route("/notifications", notifications::PAGE_ID)
}

/// Every standard page, built over `services`.
pub fn standard_pages(services: &PageServices, registry: &ControllerRegistry) -> Vec<PageController> {
    let instrumentation = registry.instrumentation();
    vec![
        dashboard::dashboard_page(services, instrumentation.clone()),
        objects::objects_page(services, instrumentation.clone()),
        reports::reports_page(services, instrumentation.clone()),
        workflows::workflows_page(services, instrumentation.clone()),
        functions::functions_page(services, instrumentation.clone()),
        notifications::notifications_page(services, instrumentation.clone()),
    ]
}

/// Mount every standard page on `registry`.
pub fn mount_standard_pages(services: &PageServices, registry: &ControllerRegistry) -> Vec<Arc<PageController>> {
    let pages: Vec<_> = standard_pages(services, registry)
        .into_iter()
        .map(|page| registry.register_page_controller(page))
        .collect();
    tracing::info!(pages = pages.len(), actions = registry.statistics().total_actions, "mounted standard pages");
    pages
}

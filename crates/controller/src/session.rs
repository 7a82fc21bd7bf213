use std::sync::Arc;

use switchboard_action::{
    ActionCategory, ActionContext, ActionMetadata, ActionParams, ActionResult, ResultMetadata,
    ActionError, ToolCall, ToolDefinition,
};
use switchboard_core::{NavigationContext, OrganizationContext, UserContext};

use crate::registry::ControllerRegistry;
use crate::route::RouteTable;

/// One signed-in user's view of the console.
///
/// Owns navigation state and the current page, and builds a fresh
/// [`ActionContext`] for every dispatch. The registry and route table are
/// injected and shared with other sessions.
#[derive(Debug)]
pub struct ConsoleSession {
    registry: Arc<ControllerRegistry>,
    routes: Arc<RouteTable>,
    user: UserContext,
    organization: Option<OrganizationContext>,
    navigation: NavigationContext,
    current_page: Option<String>,
}

impl ConsoleSession {
    /// Session at `/` for `user`.
    pub fn new(registry: Arc<ControllerRegistry>, routes: Arc<RouteTable>, user: UserContext) -> Self {
        let mut session = Self {
            registry,
            routes,
            user,
            organization: None,
            navigation: NavigationContext::default(),
            current_page: None,
        };
        session.navigate("/");
        session
    }

    /// Select an organization.
    pub fn with_organization(mut self, organization: OrganizationContext) -> Self {
        self.organization = Some(organization);
        self
    }

    /// Switch or clear the selected organization.
    pub fn set_organization(&mut self, organization: Option<OrganizationContext>) {
        self.organization = organization;
    }

    /// Signed-in user.
    pub fn user(&self) -> &UserContext {
        &self.user
    }

    /// Selected organization.
    pub fn organization(&self) -> Option<&OrganizationContext> {
        self.organization.as_ref()
    }

    /// Current navigation state.
    pub fn navigation(&self) -> &NavigationContext {
        &self.navigation
    }

    /// Page bound to the current path, if any.
    pub fn current_page(&self) -> Option<&str> {
        self.current_page.as_deref()
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<ControllerRegistry> {
        &self.registry
    }

    /// Move to `path`. Returns the page it resolves to.
    ///
    /// Only navigation state changes; the dispatch table is untouched.
    pub fn navigate(&mut self, path: &str) -> Option<&str> {
        self.navigation = NavigationContext::at(path);
        self.current_page = self.routes.resolve(path).map(|m| m.page_id);
        tracing::debug!(path, page_id = ?self.current_page, "navigated");
        self.current_page.as_deref()
    }

    /// Fresh context for dispatching `action_id`.
    ///
    /// The page snapshot comes from the action's owning controller, falling
    /// back to the controller of the current route.
    pub fn context_for(&self, action_id: &str) -> ActionContext {
        let page = self
            .registry
            .owning_page(action_id)
            .or_else(|| self.current_page.clone())
            .and_then(|page_id| self.registry.page_controller(&page_id))
            .map(|controller| controller.context().as_ref().clone());

        let context = ActionContext::new(self.user.clone())
            .with_page(page)
            .with_navigation(self.navigation.clone());
        match &self.organization {
            Some(org) => context.with_organization(org.clone()),
            None => context,
        }
    }

    /// Run an action as this session's user.
    ///
    /// A successful navigation action that returns `{"path": ...}` moves the
    /// session to that path.
    pub async fn execute_action(&mut self, action_id: &str, params: ActionParams) -> ActionResult {
        let context = self.context_for(action_id);
        let result = self.registry.execute_action(action_id, params, context).await;

        if result.success && self.is_navigation(action_id) {
            if let Some(path) = result
                .data
                .as_ref()
                .and_then(|d| d.get("path"))
                .and_then(serde_json::Value::as_str)
            {
                self.navigate(path);
            }
        }
        result
    }

    /// Actions this user may run, optionally limited to one page.
    pub fn available_actions(&self, page_id: Option<&str>) -> Vec<ActionMetadata> {
        match page_id {
            Some(page_id) => self.registry.get_page_actions(
                page_id,
                &self.user,
                self.organization.as_ref(),
            ),
            None => self
                .registry
                .get_available_actions(&self.user, self.organization.as_ref()),
        }
    }

    /// Available actions as AI tools.
    pub fn tools(&self) -> Vec<ToolDefinition> {
        self.registry
            .tool_definitions(&self.user, self.organization.as_ref())
    }

    /// Run an AI tool call.
    ///
    /// The tool name may be the raw action id or its sanitized form. Unknown
    /// names fail like unknown action ids.
    pub async fn execute_tool_call(&mut self, call: ToolCall) -> ActionResult {
        let Some(action_id) = self.registry.resolve_tool_name(&call.name) else {
            return ActionResult::from_error(
                &ActionError::not_found(&call.name),
                ResultMetadata::new(&call.name, &self.user.id, 0),
            );
        };
        tracing::debug!(tool = %call.name, %action_id, "executing tool call");
        self.execute_action(&action_id, call.params()).await
    }

    fn is_navigation(&self, action_id: &str) -> bool {
        self.registry
            .action(action_id)
            .is_some_and(|a| a.metadata().category == ActionCategory::Navigation)
    }
}

//! Registry of page controllers and the flattened action index.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use switchboard_action::{
    Action, ActionContext, ActionError, ActionExecutor, ActionMetadata, ActionParams,
    ActionResult, ResultMetadata, ToolDefinition, tool,
};
use switchboard_core::{OrganizationContext, UserContext};
use switchboard_permission::{Granted, PermissionManager, RoleGrants};
use switchboard_telemetry::{ActionEvent, ActionEventKind, Instrumentation, names};

use crate::controller::PageController;
use crate::error::RegistryError;
use crate::index::ActionIndex;
use crate::policy::DispatchPolicy;

/// Counts describing a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStatistics {
    /// Registered page controllers.
    pub total_pages: usize,
    /// Actions in the flattened index.
    pub total_actions: usize,
    /// Indexed actions per category.
    pub actions_by_category: BTreeMap<String, usize>,
    /// Actions per page.
    pub actions_by_page: BTreeMap<String, usize>,
    /// Successful executions so far.
    pub executed: u64,
    /// Failed executions so far.
    pub failed: u64,
    /// Dispatches rejected by the permission check.
    pub denied: u64,
}

/// Explicit, injectable registry of page controllers.
///
/// Holds every mounted [`PageController`] plus a flattened index from action
/// id to owning page. Share it as `Arc<ControllerRegistry>`; all methods
/// take `&self`.
///
/// Action ids are expected to be unique across pages. On a collision the
/// later registration takes the index slot and a warning is logged; removing
/// it hands the slot back to the most recent remaining holder.
///
/// Mounted controllers keep the index current themselves, so actions added
/// to or removed from a controller after mounting are dispatched (or not)
/// exactly as its listing says.
///
/// # Examples
///
/// ```rust,ignore
/// let registry = Arc::new(ControllerRegistry::new(Instrumentation::default()));
/// registry.register_page_controller(objects_page(store.clone(), registry.instrumentation().clone()));
///
/// let result = registry.execute_action("objects.count", params, context).await;
/// assert!(result.success);
/// ```
pub struct ControllerRegistry {
    pages: DashMap<String, Arc<PageController>>,
    index: Arc<ActionIndex>,
    permissions: PermissionManager,
    policy: DispatchPolicy,
    instrumentation: Instrumentation,
}

impl ControllerRegistry {
    /// Empty registry with standard role grants and enforcing dispatch.
    pub fn new(instrumentation: Instrumentation) -> Self {
        Self {
            pages: DashMap::new(),
            index: Arc::new(ActionIndex::new()),
            permissions: PermissionManager::with_roles(RoleGrants::standard()),
            policy: DispatchPolicy::default(),
            instrumentation,
        }
    }

    /// Use a different permission manager.
    pub fn with_permission_manager(mut self, permissions: PermissionManager) -> Self {
        self.permissions = permissions;
        self
    }

    /// Use a different dispatch policy.
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The permission manager used for checks.
    pub fn permission_manager(&self) -> &PermissionManager {
        &self.permissions
    }

    /// The dispatch policy.
    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Event bus and metrics shared with controllers.
    pub fn instrumentation(&self) -> &Instrumentation {
        &self.instrumentation
    }

    // ── Pages ───────────────────────────────────────────────────────────

    /// Mount a page controller and index its actions.
    ///
    /// A controller already registered under the same page id is unmounted
    /// first.
    pub fn register_page_controller(&self, controller: PageController) -> Arc<PageController> {
        let controller = Arc::new(controller);
        let page_id = controller.page_id().to_owned();

        if self.pages.contains_key(&page_id) {
            tracing::warn!(%page_id, "page controller re-registered, replacing previous");
            self.unregister_page_controller(&page_id);
        }

        self.pages.insert(page_id.clone(), controller.clone());
        controller.attach(self.index.clone());
        tracing::info!(%page_id, actions = controller.len(), "registered page controller");
        controller
    }

    /// Unmount a page controller and drop its slice of the index.
    pub fn unregister_page_controller(&self, page_id: &str) -> Option<Arc<PageController>> {
        let (_, controller) = self.pages.remove(page_id)?;
        controller.detach();
        tracing::info!(%page_id, "unregistered page controller");
        Some(controller)
    }

    /// Look up a page controller.
    pub fn page_controller(&self, page_id: &str) -> Option<Arc<PageController>> {
        self.pages.get(page_id).map(|entry| entry.value().clone())
    }

    /// Ids of every mounted page, sorted.
    pub fn page_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pages.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    // ── Actions ─────────────────────────────────────────────────────────

    /// Wrap and register an action on a mounted page.
    pub fn register_action<E>(
        &self,
        page_id: &str,
        metadata: ActionMetadata,
        executor: E,
    ) -> Result<(), RegistryError>
    where
        E: ActionExecutor,
    {
        self.require_page(page_id)?
            .register_executor(metadata, Arc::new(executor));
        Ok(())
    }

    /// Register a pre-built action on a mounted page, without wrapping.
    pub fn register_prebuilt(
        &self,
        page_id: &str,
        action: Arc<dyn Action>,
    ) -> Result<(), RegistryError> {
        self.require_page(page_id)?.register(action);
        Ok(())
    }

    /// Remove an action from its owning page.
    ///
    /// If another page also holds the id, that page's definition becomes
    /// reachable again.
    pub fn unregister_action(&self, action_id: &str) -> Option<Arc<dyn Action>> {
        let page_id = self.index.owner(action_id)?;
        let removed = self.page_controller(&page_id)?.unregister_action(action_id);
        tracing::debug!(
            %action_id,
            %page_id,
            owner = ?self.index.owner(action_id),
            "unregistered action"
        );
        removed
    }

    /// Resolve an action through the index.
    pub fn action(&self, action_id: &str) -> Option<Arc<dyn Action>> {
        self.resolve(action_id).map(|(_, action)| action)
    }

    /// Page owning an indexed action.
    pub fn owning_page(&self, action_id: &str) -> Option<String> {
        self.index.owner(action_id)
    }

    /// Map an AI tool name back to an action id.
    ///
    /// Accepts either the raw action id or its sanitized tool name.
    pub fn resolve_tool_name(&self, name: &str) -> Option<String> {
        if self.index.contains(name) {
            return Some(name.to_owned());
        }
        self.index
            .ids()
            .into_iter()
            .find(|id| tool::tool_name(id) == name)
    }

    // ── Dispatch ────────────────────────────────────────────────────────

    /// Execute an action by id.
    ///
    /// Never fails with an `Err` or a panic: unknown ids, permission denials
    /// and executor failures all come back as a failed [`ActionResult`].
    pub async fn execute_action(
        &self,
        action_id: &str,
        params: ActionParams,
        context: ActionContext,
    ) -> ActionResult {
        let Some((page_id, action)) = self.resolve(action_id) else {
            tracing::warn!(%action_id, user_id = %context.user.id, "action not found");
            return ActionResult::from_error(
                &ActionError::not_found(action_id),
                ResultMetadata::new(action_id, &context.user.id, 0),
            );
        };

        if self.policy.enforce_permissions {
            if let Err(denied) = self.check(action.metadata(), &context.user, context.organization.as_ref()) {
                return self.deny(&page_id, action.metadata(), params, &context, &denied);
            }
        }

        tracing::debug!(%action_id, %page_id, user_id = %context.user.id, "dispatching action");
        action.execute(params, context).await
    }

    /// Whether `user` may run the action. Unknown ids are never executable.
    pub fn can_execute_action(
        &self,
        action_id: &str,
        user: &UserContext,
        organization: Option<&OrganizationContext>,
    ) -> bool {
        self.validate_action_permissions(action_id, user, organization)
            .is_ok()
    }

    /// Check `user` against the action's permission config.
    pub fn validate_action_permissions(
        &self,
        action_id: &str,
        user: &UserContext,
        organization: Option<&OrganizationContext>,
    ) -> Result<Granted, ActionError> {
        let action = self
            .action(action_id)
            .ok_or_else(|| ActionError::not_found(action_id))?;
        self.check(action.metadata(), user, organization)
    }

    /// Definitions of every indexed action `user` may run, in index order.
    pub fn get_available_actions(
        &self,
        user: &UserContext,
        organization: Option<&OrganizationContext>,
    ) -> Vec<ActionMetadata> {
        self.indexed_actions()
            .into_iter()
            .filter(|(_, action)| self.check(action.metadata(), user, organization).is_ok())
            .map(|(_, action)| action.metadata().clone())
            .collect()
    }

    /// Definitions of one page's actions that `user` may run.
    pub fn get_page_actions(
        &self,
        page_id: &str,
        user: &UserContext,
        organization: Option<&OrganizationContext>,
    ) -> Vec<ActionMetadata> {
        self.page_controller(page_id)
            .map(|controller| {
                controller
                    .actions()
                    .into_iter()
                    .filter(|action| self.check(action.metadata(), user, organization).is_ok())
                    .map(|action| action.metadata().clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Available actions described as AI tools.
    pub fn tool_definitions(
        &self,
        user: &UserContext,
        organization: Option<&OrganizationContext>,
    ) -> Vec<ToolDefinition> {
        self.get_available_actions(user, organization)
            .iter()
            .map(ToolDefinition::from_metadata)
            .collect()
    }

    /// Page, action and execution counts.
    pub fn statistics(&self) -> RegistryStatistics {
        let mut stats = RegistryStatistics {
            total_pages: self.pages.len(),
            ..RegistryStatistics::default()
        };

        for entry in &self.pages {
            stats
                .actions_by_page
                .insert(entry.key().clone(), entry.value().len());
        }
        for (_, action) in self.indexed_actions() {
            stats.total_actions += 1;
            *stats
                .actions_by_category
                .entry(action.metadata().category.as_str().to_owned())
                .or_default() += 1;
        }

        let metrics = self.instrumentation.metrics();
        stats.executed = metrics.counter(names::ACTIONS_EXECUTED_TOTAL).get();
        stats.failed = metrics.counter(names::ACTIONS_FAILED_TOTAL).get();
        stats.denied = metrics.counter(names::PERMISSION_DENIED_TOTAL).get();
        stats
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn require_page(&self, page_id: &str) -> Result<Arc<PageController>, RegistryError> {
        self.page_controller(page_id)
            .ok_or_else(|| RegistryError::PageNotFound {
                page_id: page_id.to_owned(),
            })
    }

    fn resolve(&self, action_id: &str) -> Option<(String, Arc<dyn Action>)> {
        let page_id = self.owning_page(action_id)?;
        let action = self.page_controller(&page_id)?.action(action_id)?;
        Some((page_id, action))
    }

    fn indexed_actions(&self) -> Vec<(String, Arc<dyn Action>)> {
        self.index
            .ids()
            .iter()
            .filter_map(|id| self.resolve(id))
            .collect()
    }

    fn check(
        &self,
        metadata: &ActionMetadata,
        user: &UserContext,
        organization: Option<&OrganizationContext>,
    ) -> Result<Granted, ActionError> {
        self.permissions
            .validate(user, organization, &metadata.permission_config())
            .map_err(ActionError::from)
    }

    fn deny(
        &self,
        page_id: &str,
        metadata: &ActionMetadata,
        params: ActionParams,
        context: &ActionContext,
        denied: &ActionError,
    ) -> ActionResult {
        // A missing organization is reported the same way the wrapper does.
        let (kind, counter) = if matches!(denied, ActionError::OrganizationRequired) {
            (ActionEventKind::ActionFailed, names::ACTIONS_FAILED_TOTAL)
        } else {
            (ActionEventKind::PermissionDenied, names::PERMISSION_DENIED_TOTAL)
        };
        self.instrumentation.metrics().counter(counter).inc();
        tracing::warn!(
            action_id = %metadata.id,
            page_id,
            user_id = %context.user.id,
            kind = denied.kind(),
            error = %denied,
            "dispatch rejected"
        );
        self.instrumentation.events().emit(
            ActionEvent::new(kind, &metadata.id, page_id, &context.user.id)
                .with_params(params)
                .with_caller(
                    context.user.roles.clone(),
                    context.organization_id().map(str::to_owned),
                )
                .with_error(denied.to_string()),
        );
        ActionResult::from_error(denied, ResultMetadata::new(&metadata.id, &context.user.id, 0))
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("pages", &self.page_ids())
            .field("actions", &self.index.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn executor(value: Value) -> impl ActionExecutor {
        move |_: ActionParams, _: ActionContext| {
            let value = value.clone();
            async move { Ok::<_, ActionError>(value) }
        }
    }

    fn registry_with(pages: &[(&str, &[&str])]) -> ControllerRegistry {
        let registry = ControllerRegistry::new(Instrumentation::default());
        for (page_id, actions) in pages {
            let page = PageController::named(*page_id, *page_id, registry.instrumentation().clone());
            for id in *actions {
                page.register_action(ActionMetadata::new(*id, *id, "d"), executor(json!(page_id)));
            }
            registry.register_page_controller(page);
        }
        registry
    }

    #[test]
    fn index_tracks_pages() {
        let registry = registry_with(&[("a", &["a.one", "a.two"]), ("b", &["b.one"])]);
        assert_eq!(registry.owning_page("a.two").as_deref(), Some("a"));
        assert_eq!(registry.page_ids(), vec!["a", "b"]);

        registry.unregister_page_controller("a");
        assert!(registry.action("a.one").is_none());
        assert!(registry.action("b.one").is_some());
        assert_eq!(registry.statistics().total_actions, 1);
    }

    #[test]
    fn collision_later_wins_and_falls_back() {
        let registry = registry_with(&[("a", &["shared"]), ("b", &["shared"])]);
        assert_eq!(registry.owning_page("shared").as_deref(), Some("b"));

        registry.unregister_page_controller("b");
        assert_eq!(registry.owning_page("shared").as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn actions_added_to_a_mounted_page_are_dispatched() {
        let registry = registry_with(&[("x", &["getX"])]);
        let mounted = registry.page_controller("x").unwrap();
        mounted.register_action(
            ActionMetadata::new("lateX", "Late X", "d").with_organization_required(false),
            executor(json!("late")),
        );

        assert_eq!(mounted.action_ids(), vec!["getX", "lateX"]);
        assert_eq!(registry.owning_page("lateX").as_deref(), Some("x"));
        let user = UserContext::new("u").with_permission("*");
        assert!(
            registry
                .get_available_actions(&user, None)
                .iter()
                .any(|m| m.id == "lateX")
        );
        let result = registry
            .execute_action("lateX", ActionParams::new(), ActionContext::new(user))
            .await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.data, Some(json!("late")));

        mounted.unregister_action("lateX");
        assert!(registry.action("lateX").is_none());
        assert_eq!(registry.statistics().total_actions, 1);
    }

    #[test]
    fn unregister_action_restores_shadowed_definition() {
        let registry = registry_with(&[("x", &["getX"]), ("z", &["getX"])]);
        assert_eq!(registry.owning_page("getX").as_deref(), Some("z"));

        assert!(registry.unregister_action("getX").is_some());
        assert_eq!(registry.owning_page("getX").as_deref(), Some("x"));
        assert!(registry.action("getX").is_some());

        assert!(registry.unregister_action("getX").is_some());
        assert!(registry.owning_page("getX").is_none());
    }

    #[tokio::test]
    async fn missing_organization_fails_like_the_wrapper() {
        let registry = registry_with(&[("x", &["getX"])]);
        let mut events = registry.instrumentation().events().subscribe();
        let user = UserContext::new("u").with_permission("*");

        let result = registry
            .execute_action("getX", ActionParams::new(), ActionContext::new(user))
            .await;

        assert_eq!(
            result.error.as_deref(),
            Some("Organization ID is required for this operation")
        );
        assert_eq!(events.try_recv().unwrap().kind, ActionEventKind::ActionFailed);
        let stats = registry.statistics();
        assert_eq!((stats.failed, stats.denied), (1, 0));
    }

    #[test]
    fn register_action_requires_page() {
        let registry = registry_with(&[]);
        let err = registry
            .register_action("nope", ActionMetadata::new("nope.x", "X", "d"), executor(Value::Null))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::PageNotFound {
                page_id: "nope".into()
            }
        );
    }

    #[test]
    fn tool_names_resolve_back() {
        let registry = registry_with(&[("objects", &["objects.list"])]);
        assert_eq!(
            registry.resolve_tool_name("objects_list").as_deref(),
            Some("objects.list")
        );
        assert_eq!(
            registry.resolve_tool_name("objects.list").as_deref(),
            Some("objects.list")
        );
        assert!(registry.resolve_tool_name("missing").is_none());
    }

    #[test]
    fn statistics_count_categories() {
        let registry = registry_with(&[("a", &["a.one"])]);
        registry
            .register_action(
                "a",
                ActionMetadata::new("a.nav", "Nav", "d")
                    .with_category(switchboard_action::ActionCategory::Navigation),
                executor(Value::Null),
            )
            .unwrap();

        let stats = registry.statistics();
        assert_eq!(stats.total_pages, 1);
        assert_eq!(stats.total_actions, 2);
        assert_eq!(stats.actions_by_category.get("data"), Some(&1));
        assert_eq!(stats.actions_by_category.get("navigation"), Some(&1));
        assert_eq!(stats.actions_by_page.get("a"), Some(&2));
    }
}

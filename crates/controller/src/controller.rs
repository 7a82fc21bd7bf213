use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::RwLock;
use switchboard_action::{
    Action, ActionCategory, ActionExecutor, ActionMetadata, ActionTable,
};
use switchboard_core::PageContext;
use switchboard_telemetry::Instrumentation;

use crate::index::ActionIndex;
use crate::page::{PageConfig, PageMetadata};
use crate::wrapper::WrappedAction;

/// One console page and the actions it exposes.
///
/// Concrete pages build their table inside their constructor function and
/// hand the finished controller to a [`ControllerRegistry`]. The action
/// table sits behind a lock so a controller can be shared as
/// `Arc<PageController>` and still accept registrations; the page-context
/// snapshot is swapped atomically and never mutated in place.
///
/// Once mounted, registrations and removals on the controller update the
/// registry's index directly, so page listings and dispatch stay in step.
///
/// [`ControllerRegistry`]: crate::ControllerRegistry
pub struct PageController {
    metadata: PageMetadata,
    actions: RwLock<ActionTable>,
    context: ArcSwap<PageContext>,
    instrumentation: Instrumentation,
    index: ArcSwapOption<ActionIndex>,
}

impl PageController {
    /// Empty controller for a page.
    pub fn new(config: impl Into<PageMetadata>, instrumentation: Instrumentation) -> Self {
        let metadata = config.into();
        let context = PageContext::new(&metadata.page_id, &metadata.name);
        Self {
            metadata,
            actions: RwLock::new(ActionTable::new()),
            context: ArcSwap::from_pointee(context),
            instrumentation,
            index: ArcSwapOption::empty(),
        }
    }

    /// Shorthand for `PageController::new(PageConfig::new(id, name), ..)`.
    pub fn named(
        page_id: impl Into<String>,
        name: impl Into<String>,
        instrumentation: Instrumentation,
    ) -> Self {
        Self::new(PageConfig::new(page_id, name), instrumentation)
    }

    /// Page id.
    pub fn page_id(&self) -> &str {
        &self.metadata.page_id
    }

    /// Fixed page description.
    pub fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    /// Instrumentation handed to wrapped actions.
    pub fn instrumentation(&self) -> &Instrumentation {
        &self.instrumentation
    }

    /// Wrap `executor` in the execution wrapper and register it.
    ///
    /// Re-registering an id replaces the previous action, which is returned.
    pub fn register_action<E>(
        &self,
        metadata: ActionMetadata,
        executor: E,
    ) -> Option<Arc<dyn Action>>
    where
        E: ActionExecutor,
    {
        self.register_executor(metadata, Arc::new(executor))
    }

    pub(crate) fn register_executor(
        &self,
        metadata: ActionMetadata,
        executor: Arc<dyn ActionExecutor>,
    ) -> Option<Arc<dyn Action>> {
        let wrapped = WrappedAction::new(
            metadata,
            self.metadata.page_id.clone(),
            executor,
            self.instrumentation.clone(),
        );
        self.register(Arc::new(wrapped))
    }

    /// Register a pre-built action as is, without the execution wrapper.
    pub fn register(&self, action: Arc<dyn Action>) -> Option<Arc<dyn Action>> {
        let id = action.id().to_owned();
        let previous = self.actions.write().insert(action);
        if let Some(index) = self.index.load_full() {
            index.claim(&id, &self.metadata.page_id);
        }
        if previous.is_some() {
            tracing::warn!(page_id = %self.metadata.page_id, action_id = %id, "action re-registered, replacing previous definition");
        } else {
            tracing::debug!(page_id = %self.metadata.page_id, action_id = %id, "registered action");
        }
        previous
    }

    /// Remove an action.
    pub fn unregister_action(&self, action_id: &str) -> Option<Arc<dyn Action>> {
        let removed = self.actions.write().remove(action_id);
        if removed.is_some() {
            if let Some(index) = self.index.load_full() {
                index.release(action_id, &self.metadata.page_id);
            }
        }
        removed
    }

    /// Remove every action. Called when the page unmounts.
    pub fn clear(&self) {
        self.actions.write().clear();
        if let Some(index) = self.index.load_full() {
            index.release_page(&self.metadata.page_id);
        }
    }

    /// Join a registry index and claim every current action.
    pub(crate) fn attach(&self, index: Arc<ActionIndex>) {
        self.index.store(Some(index.clone()));
        for action_id in self.action_ids() {
            index.claim(&action_id, &self.metadata.page_id);
        }
    }

    /// Leave the registry index.
    pub(crate) fn detach(&self) {
        if let Some(index) = self.index.swap(None) {
            index.release_page(&self.metadata.page_id);
        }
    }

    /// Look up an action.
    pub fn action(&self, action_id: &str) -> Option<Arc<dyn Action>> {
        self.actions.read().get(action_id).cloned()
    }

    /// Whether the page has an action with this id.
    pub fn has_action(&self, action_id: &str) -> bool {
        self.actions.read().contains(action_id)
    }

    /// Every action, in registration order.
    pub fn actions(&self) -> Vec<Arc<dyn Action>> {
        self.actions.read().iter().map(|(_, a)| a.clone()).collect()
    }

    /// Action ids, in registration order.
    pub fn action_ids(&self) -> Vec<String> {
        self.actions
            .read()
            .iter()
            .map(|(id, _)| id.to_owned())
            .collect()
    }

    /// Metadata of every action, in registration order.
    pub fn definitions(&self) -> Vec<ActionMetadata> {
        self.actions.read().list().into_iter().cloned().collect()
    }

    /// Actions in a category.
    pub fn actions_by_category(&self, category: ActionCategory) -> Vec<Arc<dyn Action>> {
        self.actions.read().by_category(category)
    }

    /// Actions that list `permission` among their requirements.
    pub fn actions_with_permission(&self, permission: &str) -> Vec<Arc<dyn Action>> {
        self.actions.read().requiring(permission)
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    /// Returns `true` if the page has no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }

    /// Current page-context snapshot.
    pub fn context(&self) -> Arc<PageContext> {
        self.context.load_full()
    }

    /// Replace the page-context snapshot.
    pub fn set_context(&self, context: PageContext) {
        self.context.store(Arc::new(context));
    }

    /// Set one state key, replacing the snapshot.
    pub fn set_state(&self, key: &str, value: serde_json::Value) {
        self.context.rcu(|current| {
            let mut next = PageContext::clone(current);
            next.state.insert(key.to_owned(), value.clone());
            next
        });
    }
}

impl std::fmt::Debug for PageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("page_id", &self.metadata.page_id)
            .field("actions", &self.action_ids())
            .finish_non_exhaustive()
    }
}

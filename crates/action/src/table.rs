use std::sync::Arc;

use indexmap::IndexMap;

use crate::action::Action;
use crate::metadata::{ActionCategory, ActionMetadata};

/// Ordered table of actions keyed by id.
///
/// A page controller owns one of these. Insertion order is kept so listings
/// are stable, and actions are stored as `Arc<dyn Action>` so a dispatch can
/// hold its action while the table is being changed.
///
/// # Example
///
/// ```rust,ignore
/// let mut table = ActionTable::new();
/// table.insert(Arc::new(my_action));
///
/// assert!(table.get("objects.list").is_some());
/// assert!(table.get("unknown").is_none());
/// ```
#[derive(Default, Clone)]
pub struct ActionTable {
    actions: IndexMap<String, Arc<dyn Action>>,
}

impl ActionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an action. Overwrites any existing action with the same id and
    /// returns it.
    pub fn insert(&mut self, action: Arc<dyn Action>) -> Option<Arc<dyn Action>> {
        let id = action.id().to_owned();
        self.actions.insert(id, action)
    }

    /// Look up an action by id.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Action>> {
        self.actions.get(id)
    }

    /// Check whether an action with the given id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    /// Remove an action by id, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<Arc<dyn Action>> {
        self.actions.shift_remove(id)
    }

    /// Remove every action.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Metadata for all actions, in insertion order.
    pub fn list(&self) -> Vec<&ActionMetadata> {
        self.actions.values().map(|a| a.metadata()).collect()
    }

    /// Actions in the given category.
    pub fn by_category(&self, category: ActionCategory) -> Vec<Arc<dyn Action>> {
        self.actions
            .values()
            .filter(|a| a.metadata().category == category)
            .cloned()
            .collect()
    }

    /// Actions that list `permission` among their requirements.
    pub fn requiring(&self, permission: &str) -> Vec<Arc<dyn Action>> {
        self.actions
            .values()
            .filter(|a| a.required_permissions().iter().any(|p| p == permission))
            .cloned()
            .collect()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate over `(id, action)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Action>)> {
        self.actions.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl std::fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionTable")
            .field("count", &self.actions.len())
            .field("ids", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ActionContext;
    use crate::parameter::ActionParams;
    use crate::result::{ActionResult, ResultMetadata};
    use async_trait::async_trait;

    struct DummyAction(ActionMetadata);

    #[async_trait]
    impl Action for DummyAction {
        fn metadata(&self) -> &ActionMetadata {
            &self.0
        }

        async fn execute(&self, _params: ActionParams, ctx: ActionContext) -> ActionResult {
            ActionResult::success(
                serde_json::Value::Null,
                "ok",
                ResultMetadata::new(self.id(), ctx.user.id, 0),
            )
        }
    }

    fn make_action(id: &str, name: &str) -> Arc<dyn Action> {
        Arc::new(DummyAction(ActionMetadata::new(id, name, "test")))
    }

    #[test]
    fn empty_table() {
        let table = ActionTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert!(table.get("anything").is_none());
    }

    #[test]
    fn insert_and_get() {
        let mut table = ActionTable::new();
        table.insert(make_action("objects.list", "List Objects"));

        assert_eq!(table.len(), 1);
        let action = table.get("objects.list").unwrap();
        assert_eq!(action.metadata().name, "List Objects");
        assert!(table.contains("objects.list"));
    }

    #[test]
    fn overwrite_existing() {
        let mut table = ActionTable::new();
        assert!(table.insert(make_action("x", "Version 1")).is_none());
        let previous = table.insert(make_action("x", "Version 2"));

        assert_eq!(previous.unwrap().metadata().name, "Version 1");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("x").unwrap().metadata().name, "Version 2");
    }

    #[test]
    fn list_keeps_insertion_order() {
        let mut table = ActionTable::new();
        table.insert(make_action("b", "B"));
        table.insert(make_action("a", "A"));
        table.insert(make_action("c", "C"));
        table.remove("a");

        let ids: Vec<&str> = table.list().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn filter_by_category_and_permission() {
        let mut table = ActionTable::new();
        table.insert(Arc::new(DummyAction(
            ActionMetadata::new("nav", "Nav", "t")
                .with_category(ActionCategory::Navigation)
                .with_permission("dashboard:read"),
        )));
        table.insert(Arc::new(DummyAction(
            ActionMetadata::new("data", "Data", "t").with_permission("objects:read"),
        )));

        let nav = table.by_category(ActionCategory::Navigation);
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].id(), "nav");

        let readers = table.requiring("objects:read");
        assert_eq!(readers.len(), 1);
        assert_eq!(readers[0].id(), "data");
    }

    #[test]
    fn clear_empties_table() {
        let mut table = ActionTable::new();
        table.insert(make_action("a", "A"));
        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn debug_format() {
        let mut table = ActionTable::new();
        table.insert(make_action("test", "Test"));
        let debug = format!("{table:?}");
        assert!(debug.contains("ActionTable"));
        assert!(debug.contains("count: 1"));
    }
}

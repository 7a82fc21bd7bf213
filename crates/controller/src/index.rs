//! Flattened action-id index shared by a registry and its mounted pages.

use indexmap::IndexMap;
use parking_lot::RwLock;

/// Action id to the pages holding it, in registration order.
///
/// The last holder owns the id. Releasing the owner hands the id back to the
/// most recent remaining holder.
#[derive(Debug, Default)]
pub(crate) struct ActionIndex {
    holders: RwLock<IndexMap<String, Vec<String>>>,
}

impl ActionIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record that `page_id` (re)registered `action_id`; it becomes the owner.
    pub(crate) fn claim(&self, action_id: &str, page_id: &str) {
        let previous = {
            let mut holders = self.holders.write();
            let pages = holders.entry(action_id.to_owned()).or_default();
            let previous = pages.last().cloned();
            pages.retain(|p| p != page_id);
            pages.push(page_id.to_owned());
            previous
        };
        if let Some(previous) = previous.filter(|p| p != page_id) {
            tracing::warn!(
                %action_id,
                previous_page = %previous,
                page_id,
                "action id collision, later registration wins"
            );
        }
    }

    /// Drop `page_id` as a holder of `action_id`. Returns the new owner.
    pub(crate) fn release(&self, action_id: &str, page_id: &str) -> Option<String> {
        let mut holders = self.holders.write();
        let pages = holders.get_mut(action_id)?;
        let was_owner = pages.last().is_some_and(|p| p == page_id);
        pages.retain(|p| p != page_id);

        let Some(owner) = pages.last().cloned() else {
            holders.shift_remove(action_id);
            return None;
        };
        if was_owner {
            tracing::debug!(%action_id, page_id = %owner, "shadowed definition takes the slot back");
        }
        Some(owner)
    }

    /// Drop `page_id` as a holder of every id.
    pub(crate) fn release_page(&self, page_id: &str) {
        let ids: Vec<String> = self.holders.read().keys().cloned().collect();
        for action_id in ids {
            self.release(&action_id, page_id);
        }
    }

    /// Page owning `action_id`.
    pub(crate) fn owner(&self, action_id: &str) -> Option<String> {
        self.holders
            .read()
            .get(action_id)
            .and_then(|pages| pages.last().cloned())
    }

    pub(crate) fn contains(&self, action_id: &str) -> bool {
        self.holders.read().contains_key(action_id)
    }

    /// Indexed ids, in first-registration order.
    pub(crate) fn ids(&self) -> Vec<String> {
        self.holders.read().keys().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.holders.read().len()
    }
}

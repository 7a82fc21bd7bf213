use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use switchboard_core::{
    NavigationContext, OrganizationContext, PageContext, UserContext, resolve_organization_id,
};

/// Context provided to an action for exactly one invocation.
///
/// Built fresh by the caller (usually a `ConsoleSession`) and passed by
/// value. Nothing in it is shared with other invocations, so executors may
/// hold it across `.await` points freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ActionContext {
    /// Principal the action runs for.
    pub user: UserContext,
    /// Tenant, when the session has one selected.
    pub organization: Option<OrganizationContext>,
    /// Snapshot of the page the action belongs to.
    pub page: Option<PageContext>,
    /// Where the user is in the console.
    pub navigation: NavigationContext,
    /// When the context was built.
    pub timestamp: DateTime<Utc>,
}

impl ActionContext {
    /// Context for a user with no organization, page, or navigation state.
    pub fn new(user: UserContext) -> Self {
        Self {
            user,
            organization: None,
            page: None,
            navigation: NavigationContext::default(),
            timestamp: Utc::now(),
        }
    }

    /// Attach an organization.
    pub fn with_organization(mut self, organization: OrganizationContext) -> Self {
        self.organization = Some(organization);
        self
    }

    /// Attach or clear the page snapshot.
    pub fn with_page(mut self, page: Option<PageContext>) -> Self {
        self.page = page;
        self
    }

    /// Set navigation state.
    pub fn with_navigation(mut self, navigation: NavigationContext) -> Self {
        self.navigation = navigation;
        self
    }

    /// Organization id from the user, falling back to the organization.
    pub fn organization_id(&self) -> Option<&str> {
        resolve_organization_id(&self.user, self.organization.as_ref())
    }

    /// Id of the page snapshot, if any.
    pub fn page_id(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.page_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_id_resolution() {
        let ctx = ActionContext::new(UserContext::new("u"));
        assert_eq!(ctx.organization_id(), None);

        let ctx = ctx.with_organization(OrganizationContext::new("org-1", "One"));
        assert_eq!(ctx.organization_id(), Some("org-1"));

        let ctx = ActionContext::new(UserContext::new("u").with_organization("org-u"))
            .with_organization(OrganizationContext::new("org-1", "One"));
        assert_eq!(ctx.organization_id(), Some("org-u"));
    }

    #[test]
    fn page_snapshot() {
        let ctx = ActionContext::new(UserContext::new("u"))
            .with_page(Some(PageContext::new("objects", "Objects")));
        assert_eq!(ctx.page_id(), Some("objects"));
    }

    #[test]
    fn clones_are_independent() {
        let original = ActionContext::new(UserContext::new("u"));
        let mut copy = original.clone();
        copy.user.roles.push("Member".into());
        assert!(original.user.roles.is_empty());
    }
}

//! User, organization, page and navigation context values.

use serde::{Deserialize, Serialize};

use crate::JsonMap;

/// The principal an action runs on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    /// Stable user identifier.
    pub id: String,
    /// Role names (e.g. `"SystemAdmin"`, `"Member"`).
    #[serde(default)]
    pub roles: Vec<String>,
    /// Directly granted permission strings (e.g. `"objects:read"`).
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Organization the user belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl UserContext {
    /// Create a user with no roles, permissions or organization.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Add a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add a directly granted permission.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Add several directly granted permissions.
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Set the user's organization.
    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Whether the user carries the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Tenant the current session is scoped to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationContext {
    /// Organization identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Organization-level settings.
    #[serde(default)]
    pub settings: JsonMap,
}

impl OrganizationContext {
    /// Create an organization with empty settings.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            settings: JsonMap::new(),
        }
    }

    /// Set a single settings entry.
    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }
}

/// Resolve the organization id from the user first, then the organization.
///
/// Empty strings count as absent.
pub fn resolve_organization_id<'a>(
    user: &'a UserContext,
    organization: Option<&'a OrganizationContext>,
) -> Option<&'a str> {
    user.organization_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .or_else(|| organization.map(|o| o.id.as_str()).filter(|id| !id.is_empty()))
}

/// Snapshot of a page's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    /// Page identifier (e.g. `"objects"`).
    pub page_id: String,
    /// Display name.
    pub page_name: String,
    /// Arbitrary page state and props.
    #[serde(default)]
    pub state: JsonMap,
}

impl PageContext {
    /// Create an empty page context.
    pub fn new(page_id: impl Into<String>, page_name: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            page_name: page_name.into(),
            state: JsonMap::new(),
        }
    }

    /// Return a copy with one state entry set.
    pub fn with_state(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.state.insert(key.into(), value);
        self
    }
}

/// A single breadcrumb entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Display label.
    pub label: String,
    /// Target path.
    pub path: String,
}

/// Where the user currently is in the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationContext {
    /// Current client-side path (e.g. `"/objects/Customer"`).
    pub current_path: String,
    /// Breadcrumb trail, root first.
    #[serde(default)]
    pub breadcrumbs: Vec<Breadcrumb>,
}

impl NavigationContext {
    /// Navigation state for a path, with breadcrumbs derived from its segments.
    pub fn at(path: impl Into<String>) -> Self {
        let current_path = path.into();
        let mut breadcrumbs = Vec::new();
        let mut prefix = String::new();
        for segment in current_path.split('/').filter(|s| !s.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);
            breadcrumbs.push(Breadcrumb {
                label: segment.to_owned(),
                path: prefix.clone(),
            });
        }
        Self {
            current_path,
            breadcrumbs,
        }
    }
}

impl Default for NavigationContext {
    fn default() -> Self {
        Self::at("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn organization_resolves_from_user_first() {
        let user = UserContext::new("u").with_organization("from-user");
        let org = OrganizationContext::new("from-org", "Org");
        assert_eq!(resolve_organization_id(&user, Some(&org)), Some("from-user"));
    }

    #[test]
    fn organization_falls_back_to_context() {
        let user = UserContext::new("u");
        let org = OrganizationContext::new("from-org", "Org");
        assert_eq!(resolve_organization_id(&user, Some(&org)), Some("from-org"));
        assert_eq!(resolve_organization_id(&user, None), None);
    }

    #[test]
    fn empty_organization_ids_are_absent() {
        let user = UserContext::new("u").with_organization("");
        let org = OrganizationContext::new("", "Nameless");
        assert_eq!(resolve_organization_id(&user, Some(&org)), None);
    }

    #[test]
    fn breadcrumbs_follow_path_segments() {
        let nav = NavigationContext::at("/objects/Customer");
        assert_eq!(
            nav.breadcrumbs,
            vec![
                Breadcrumb {
                    label: "objects".into(),
                    path: "/objects".into()
                },
                Breadcrumb {
                    label: "Customer".into(),
                    path: "/objects/Customer".into()
                },
            ]
        );
        assert!(NavigationContext::default().breadcrumbs.is_empty());
    }

    #[test]
    fn user_serializes_camel_case() {
        let user = UserContext::new("u-1").with_organization("org-1");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["organizationId"], "org-1");
    }
}

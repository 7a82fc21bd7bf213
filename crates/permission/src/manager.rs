//! Permission validation against a user and organization.

use indexmap::IndexMap;
use switchboard_core::{OrganizationContext, UserContext, resolve_organization_id};

use crate::config::PermissionConfig;
use crate::matcher::has_permission;
use crate::{SYSTEM_ADMIN_PERMISSION, SYSTEM_ADMIN_ROLES};

/// Why a permission check failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionDenied {
    /// No organization id could be resolved.
    #[error("Organization context is required")]
    OrganizationRequired,

    /// Required permissions were not held.
    #[error("{}", missing_message(.missing, .require_all))]
    Missing {
        /// Permissions the user does not hold.
        missing: Vec<String>,
        /// Whether the check was ALL (`true`) or ANY (`false`).
        require_all: bool,
    },
}

fn missing_message(missing: &[String], require_all: &bool) -> String {
    if *require_all {
        format!("Missing required permissions: {}", missing.join(", "))
    } else {
        format!("Requires at least one of: {}", missing.join(", "))
    }
}

/// How a successful check was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granted {
    /// Nothing was required.
    Unrestricted,
    /// The user is a system administrator and bypass was enabled.
    SystemAdmin,
    /// The user holds the required permissions.
    Held,
}

/// Role name → permissions granted by that role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGrants {
    grants: IndexMap<String, Vec<String>>,
}

impl RoleGrants {
    /// Empty grant table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant table used by the console out of the box.
    ///
    /// `SystemAdmin` deliberately has no grant: it passes checks only through
    /// the bypass.
    pub fn standard() -> Self {
        Self::new()
            .grant(
                "OrgAdmin",
                [
                    "objects:*",
                    "workflows:*",
                    "functions:*",
                    "notifications:*",
                    "reports:*",
                    "dashboard:*",
                ],
            )
            .grant("Member", ["*:read"])
    }

    /// Add permissions to a role.
    pub fn grant<I, S>(mut self, role: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants
            .entry(role.into())
            .or_default()
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Permissions granted to a role.
    pub fn for_role(&self, role: &str) -> &[String] {
        self.grants.get(role).map_or(&[][..], Vec::as_slice)
    }

    /// Number of roles with grants.
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Whether no roles have grants.
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

/// Runs permission checks.
///
/// # Examples
///
/// ```
/// use switchboard_core::UserContext;
/// use switchboard_permission::{PermissionConfig, PermissionManager};
///
/// let manager = PermissionManager::new();
/// let user = UserContext::new("u-1")
///     .with_permission("objects:*")
///     .with_organization("org-1");
///
/// assert!(manager.validate(&user, None, &PermissionConfig::all(["objects:read"])).is_ok());
/// assert!(manager.validate(&user, None, &PermissionConfig::all(["reports:read"])).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PermissionManager {
    roles: RoleGrants,
}

impl PermissionManager {
    /// Manager with no role grants; only direct permissions count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager expanding the given role grants.
    pub fn with_roles(roles: RoleGrants) -> Self {
        Self { roles }
    }

    /// The role grant table.
    pub fn roles(&self) -> &RoleGrants {
        &self.roles
    }

    /// Direct permissions plus everything granted by the user's roles.
    pub fn effective_permissions(&self, user: &UserContext) -> Vec<String> {
        let mut permissions = user.permissions.clone();
        for role in &user.roles {
            for granted in self.roles.for_role(role) {
                if !permissions.contains(granted) {
                    permissions.push(granted.clone());
                }
            }
        }
        permissions
    }

    /// Whether the user is a system administrator.
    pub fn is_system_admin(&self, user: &UserContext) -> bool {
        user.permissions.iter().any(|p| p == SYSTEM_ADMIN_PERMISSION)
            || SYSTEM_ADMIN_ROLES.iter().any(|role| user.has_role(role))
    }

    /// Whether the user holds a single permission.
    pub fn can(&self, user: &UserContext, required: &str) -> bool {
        has_permission(&self.effective_permissions(user), required)
    }

    /// Check `config` against the user and organization.
    ///
    /// Order: organization requirement, system-admin bypass, then the
    /// permission list. An empty permission list always passes the last step.
    pub fn validate(
        &self,
        user: &UserContext,
        organization: Option<&OrganizationContext>,
        config: &PermissionConfig,
    ) -> Result<Granted, PermissionDenied> {
        if config.organization_required && resolve_organization_id(user, organization).is_none() {
            tracing::debug!(user_id = %user.id, "permission check failed: no organization");
            return Err(PermissionDenied::OrganizationRequired);
        }

        if config.system_admin_bypass && self.is_system_admin(user) {
            return Ok(Granted::SystemAdmin);
        }

        if config.permissions.is_empty() {
            return Ok(Granted::Unrestricted);
        }

        let effective = self.effective_permissions(user);
        let (held, missing): (Vec<&String>, Vec<&String>) = config
            .permissions
            .iter()
            .partition(|required| has_permission(&effective, required));

        let passed = if config.require_all {
            missing.is_empty()
        } else {
            !held.is_empty()
        };

        if passed {
            Ok(Granted::Held)
        } else {
            tracing::debug!(
                user_id = %user.id,
                missing = ?missing,
                require_all = config.require_all,
                "permission check failed"
            );
            Err(PermissionDenied::Missing {
                missing: missing.into_iter().cloned().collect(),
                require_all: config.require_all,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn member() -> UserContext {
        UserContext::new("u-1")
            .with_permissions(["objects:read", "workflows:*"])
            .with_organization("org-1")
    }

    #[test]
    fn empty_permissions_pass_in_both_modes() {
        let manager = PermissionManager::new();
        let user = UserContext::new("u").with_organization("org");
        let all = PermissionConfig::all(Vec::<String>::new());
        let any = PermissionConfig::any(Vec::<String>::new());
        assert_eq!(manager.validate(&user, None, &all), Ok(Granted::Unrestricted));
        assert_eq!(manager.validate(&user, None, &any), Ok(Granted::Unrestricted));
    }

    #[test]
    fn organization_required_without_organization() {
        let manager = PermissionManager::new();
        let user = UserContext::new("u").with_permission("*");
        let err = manager
            .validate(&user, None, &PermissionConfig::default())
            .unwrap_err();
        assert_eq!(err, PermissionDenied::OrganizationRequired);
        assert!(err.to_string().contains("Organization context is required"));
    }

    #[test]
    fn organization_from_context_satisfies_requirement() {
        let manager = PermissionManager::new();
        let user = UserContext::new("u");
        let org = OrganizationContext::new("org-9", "Nine");
        assert!(
            manager
                .validate(&user, Some(&org), &PermissionConfig::default())
                .is_ok()
        );
    }

    #[test]
    fn organization_not_required() {
        let manager = PermissionManager::new();
        let user = UserContext::new("u").with_permission("x:read");
        let config = PermissionConfig::all(["x:read"]).with_organization_required(false);
        assert_eq!(manager.validate(&user, None, &config), Ok(Granted::Held));
    }

    #[test]
    fn system_admin_bypass() {
        let manager = PermissionManager::new();
        let admin = UserContext::new("root")
            .with_role("SystemAdmin")
            .with_organization("org");
        let unsatisfiable = PermissionConfig::all(["nothing:ever", "nope:never"]);

        assert_eq!(
            manager.validate(&admin, None, &unsatisfiable),
            Ok(Granted::SystemAdmin)
        );

        let strict = unsatisfiable.clone().with_system_admin_bypass(false);
        assert!(manager.validate(&admin, None, &strict).is_err());

        let literal = admin.clone().with_permissions(["nothing:ever", "nope:never"]);
        assert_eq!(manager.validate(&literal, None, &strict), Ok(Granted::Held));
    }

    #[test]
    fn system_admin_by_permission_or_lowercase_role() {
        let manager = PermissionManager::new();
        assert!(manager.is_system_admin(&UserContext::new("a").with_permission("system:admin")));
        assert!(manager.is_system_admin(&UserContext::new("b").with_role("system:admin")));
        assert!(!manager.is_system_admin(&UserContext::new("c").with_role("Member")));
    }

    #[test]
    fn require_all_lists_missing() {
        let manager = PermissionManager::new();
        let config = PermissionConfig::all(["objects:read", "objects:write", "workflows:run"]);
        let err = manager.validate(&member(), None, &config).unwrap_err();
        assert_eq!(
            err,
            PermissionDenied::Missing {
                missing: vec!["objects:write".into()],
                require_all: true,
            }
        );
        assert_eq!(err.to_string(), "Missing required permissions: objects:write");
    }

    #[test]
    fn require_any_passes_with_one_held() {
        let manager = PermissionManager::new();
        let config = PermissionConfig::any(["objects:write", "objects:read"]);
        assert_eq!(manager.validate(&member(), None, &config), Ok(Granted::Held));

        let none_held = PermissionConfig::any(["reports:read", "reports:write"]);
        let err = manager.validate(&member(), None, &none_held).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requires at least one of: reports:read, reports:write"
        );
    }

    #[test]
    fn role_grants_expand_permissions() {
        let manager = PermissionManager::with_roles(RoleGrants::standard());
        let user = UserContext::new("m")
            .with_role("Member")
            .with_organization("org");

        assert!(manager.can(&user, "reports:read"));
        assert!(!manager.can(&user, "reports:write"));

        let admin = UserContext::new("a").with_role("OrgAdmin");
        assert!(manager.can(&admin, "workflows:execute"));
        assert!(!manager.can(&admin, "system:admin"));
    }

    #[test]
    fn effective_permissions_deduplicate() {
        let roles = RoleGrants::new().grant("R", ["a:read", "b:read"]);
        let manager = PermissionManager::with_roles(roles);
        let user = UserContext::new("u").with_permission("a:read").with_role("R");
        assert_eq!(
            manager.effective_permissions(&user),
            vec!["a:read".to_string(), "b:read".to_string()]
        );
    }
}

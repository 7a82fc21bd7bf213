//! Declarative description of what a permission check requires.

use serde::{Deserialize, Serialize};

/// What a caller must hold to pass a check.
///
/// Defaults: all permissions required, organization required, system
/// administrators bypass the permission list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PermissionConfig {
    /// Permission strings to check.
    pub permissions: Vec<String>,
    /// `true`: every permission must be held. `false`: at least one.
    pub require_all: bool,
    /// Fail when no organization id can be resolved.
    pub organization_required: bool,
    /// Let system administrators skip the permission list.
    pub system_admin_bypass: bool,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            permissions: Vec::new(),
            require_all: true,
            organization_required: true,
            system_admin_bypass: true,
        }
    }
}

impl PermissionConfig {
    /// Require every one of `permissions`.
    pub fn all<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Require at least one of `permissions`.
    pub fn any<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            require_all: false,
            ..Self::all(permissions)
        }
    }

    /// Set whether an organization must be resolvable.
    pub fn with_organization_required(mut self, required: bool) -> Self {
        self.organization_required = required;
        self
    }

    /// Set whether system administrators bypass the permission list.
    pub fn with_system_admin_bypass(mut self, bypass: bool) -> Self {
        self.system_admin_bypass = bypass;
        self
    }
}

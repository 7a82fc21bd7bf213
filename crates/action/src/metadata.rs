use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};
use switchboard_permission::PermissionConfig;

use crate::parameter::ActionParameter;

/// What kind of effect an action has, used for UI grouping and filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    /// Moves the user somewhere in the console.
    Navigation,
    /// Reads or writes records.
    #[default]
    Data,
    /// Changes client-side presentation only.
    Ui,
    /// Calls out to a remote system (cloud functions, messaging).
    External,
}

impl ActionCategory {
    /// Lowercase name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Data => "data",
            Self::Ui => "ui",
            Self::External => "external",
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A worked example shown to users and to the AI assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionExample {
    /// What the example demonstrates.
    pub description: String,
    /// Parameters for the example call.
    pub params: serde_json::Value,
}

/// Static metadata describing an action.
///
/// Immutable once registered. Identity is [`id`](Self::id), unique within a
/// controller and, by convention, across the whole registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMetadata {
    /// Unique key (e.g. `"objects.list"`).
    pub id: String,
    /// Human-readable display name (e.g. `"List Objects"`).
    pub name: String,
    /// Short description of what this action does.
    pub description: String,
    /// UI grouping.
    pub category: ActionCategory,
    /// Permission strings a caller must hold.
    pub permissions: Vec<String>,
    /// ALL (`true`) or ANY (`false`) semantics for [`permissions`](Self::permissions).
    pub require_all_permissions: bool,
    /// Whether the execution wrapper demands an organization id.
    pub requires_organization: bool,
    /// Ordered parameter list.
    pub parameters: Vec<ActionParameter>,
    /// Free-form tags for search.
    pub tags: Vec<String>,
    /// Example invocations.
    pub examples: Vec<ActionExample>,
    /// Deprecated actions stay callable but are flagged to callers.
    pub deprecated: bool,
    /// Action version.
    pub version: Version,
}

impl ActionMetadata {
    /// Create metadata with the minimum required fields.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category: ActionCategory::default(),
            permissions: Vec::new(),
            require_all_permissions: true,
            requires_organization: true,
            parameters: Vec::new(),
            tags: Vec::new(),
            examples: Vec::new(),
            deprecated: false,
            version: Version::new(1, 0, 0),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: ActionCategory) -> Self {
        self.category = category;
        self
    }

    /// Add a required permission.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Accept any one of the listed permissions instead of requiring all.
    pub fn with_any_permission(mut self) -> Self {
        self.require_all_permissions = false;
        self
    }

    /// Set whether an organization id must be resolvable.
    pub fn with_organization_required(mut self, required: bool) -> Self {
        self.requires_organization = required;
        self
    }

    /// Append a parameter.
    pub fn with_parameter(mut self, parameter: ActionParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add an example invocation.
    pub fn with_example(mut self, description: impl Into<String>, params: serde_json::Value) -> Self {
        self.examples.push(ActionExample {
            description: description.into(),
            params,
        });
        self
    }

    /// Mark as deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Set the version.
    pub fn with_version(mut self, major: u64, minor: u64, patch: u64) -> Self {
        self.version = Version::new(major, minor, patch);
        self
    }

    /// Permission check this action demands of its caller.
    pub fn permission_config(&self) -> PermissionConfig {
        PermissionConfig {
            permissions: self.permissions.clone(),
            require_all: self.require_all_permissions,
            organization_required: self.requires_organization,
            system_admin_bypass: true,
        }
    }

    /// Look up a declared parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ActionParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterType;

    #[test]
    fn metadata_builder() {
        let meta = ActionMetadata::new("objects.list", "List Objects", "List records")
            .with_category(ActionCategory::Data)
            .with_permission("objects:read")
            .with_tag("crud")
            .with_version(2, 1, 0);

        assert_eq!(meta.id, "objects.list");
        assert_eq!(meta.category, ActionCategory::Data);
        assert_eq!(meta.permissions, vec!["objects:read"]);
        assert_eq!(meta.tags, vec!["crud"]);
        assert_eq!(meta.version, Version::new(2, 1, 0));
    }

    #[test]
    fn default_metadata_values() {
        let meta = ActionMetadata::new("noop", "No-Op", "Does nothing");
        assert_eq!(meta.version, Version::new(1, 0, 0));
        assert_eq!(meta.category, ActionCategory::Data);
        assert!(meta.require_all_permissions);
        assert!(meta.requires_organization);
        assert!(!meta.deprecated);
        assert!(meta.parameters.is_empty());
        assert!(meta.examples.is_empty());
    }

    #[test]
    fn permission_config_mirrors_metadata() {
        let meta = ActionMetadata::new("x", "X", "x")
            .with_permission("a:read")
            .with_permission("b:read")
            .with_any_permission()
            .with_organization_required(false);
        let config = meta.permission_config();
        assert_eq!(config.permissions, vec!["a:read", "b:read"]);
        assert!(!config.require_all);
        assert!(!config.organization_required);
        assert!(config.system_admin_bypass);
    }

    #[test]
    fn parameter_lookup() {
        let meta = ActionMetadata::new("x", "X", "x")
            .with_parameter(ActionParameter::new("limit", ParameterType::Integer));
        assert!(meta.parameter("limit").is_some());
        assert!(meta.parameter("offset").is_none());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_value(ActionCategory::External).unwrap();
        assert_eq!(json, serde_json::json!("external"));
        assert_eq!(ActionCategory::Navigation.to_string(), "navigation");
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let meta = ActionMetadata::new("x", "X", "x");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["requiresOrganization"], serde_json::json!(true));
        assert_eq!(json["version"], serde_json::json!("1.0.0"));
    }
}

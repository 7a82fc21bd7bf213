use std::time::Duration;

use switchboard_permission::PermissionDenied;

/// Error type for all action operations.
///
/// Never escapes dispatch: the controller renders it with `Display` into
/// [`ActionResult::error`](crate::ActionResult). Messages are written for
/// end users, since the console surfaces them directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ActionError {
    /// No organization id could be resolved for a tenant-scoped action.
    #[error("Organization ID is required for this operation")]
    OrganizationRequired,

    /// The caller lacks the permissions the action declares.
    #[error("{0}")]
    PermissionDenied(String),

    /// No action is registered under the id.
    #[error("Action not found: {0}")]
    NotFound(String),

    /// Business logic failed. Rendered as the bare message.
    #[error("{0}")]
    Execution(String),

    /// A parameter was missing, mistyped, or broke a validation rule.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A remote operation did not finish in time.
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        /// What timed out (e.g. `"Cloud function 'sendEmail'"`).
        operation: String,
        /// How long the caller waited.
        after: Duration,
    },

    /// The object store or function runtime rejected the call.
    #[error("Store error: {0}")]
    Store(String),
}

impl ActionError {
    /// Create an execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error for an action id.
    pub fn not_found(action_id: impl Into<String>) -> Self {
        Self::NotFound(action_id.into())
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Stable snake_case name of the variant, used in audit payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrganizationRequired => "organization_required",
            Self::PermissionDenied(_) => "permission_denied",
            Self::NotFound(_) => "action_not_found",
            Self::Execution(_) => "executor_error",
            Self::Validation(_) => "validation_error",
            Self::Timeout { .. } => "timeout",
            Self::Store(_) => "store_error",
        }
    }

    /// Returns `true` for permission failures.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

impl From<PermissionDenied> for ActionError {
    fn from(denied: PermissionDenied) -> Self {
        match denied {
            PermissionDenied::OrganizationRequired => Self::OrganizationRequired,
            other => Self::PermissionDenied(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_renders_bare_message() {
        assert_eq!(ActionError::execution("boom").to_string(), "boom");
    }

    #[test]
    fn display_formatting() {
        assert_eq!(
            ActionError::OrganizationRequired.to_string(),
            "Organization ID is required for this operation"
        );
        assert_eq!(
            ActionError::not_found("getX").to_string(),
            "Action not found: getX"
        );
        assert_eq!(
            ActionError::validation("className is required").to_string(),
            "Validation failed: className is required"
        );
        let timeout = ActionError::Timeout {
            operation: "Cloud function 'sendEmail'".into(),
            after: Duration::from_millis(1500),
        };
        assert_eq!(
            timeout.to_string(),
            "Cloud function 'sendEmail' timed out after 1500ms"
        );
    }

    #[test]
    fn permission_denied_converts_with_message() {
        let err: ActionError = PermissionDenied::Missing {
            missing: vec!["x:read".into()],
            require_all: true,
        }
        .into();
        assert!(err.is_permission_denied());
        assert_eq!(err.to_string(), "Missing required permissions: x:read");

        let err: ActionError = PermissionDenied::OrganizationRequired.into();
        assert_eq!(err, ActionError::OrganizationRequired);
        assert!(!err.is_permission_denied());
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ActionError::execution("x").kind(), "executor_error");
        assert_eq!(ActionError::not_found("x").kind(), "action_not_found");
        assert_eq!(ActionError::OrganizationRequired.kind(), "organization_required");
    }
}

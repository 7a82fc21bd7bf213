use serde::{Deserialize, Serialize};

/// How the registry treats permissions at dispatch time.
///
/// With `enforce_permissions` on (the default) the registry checks the
/// caller against the action's permission config before running it. Turned
/// off, dispatch is advisory: callers are expected to filter with
/// `get_available_actions` or `can_execute_action` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DispatchPolicy {
    /// Check permissions inside `execute_action`.
    pub enforce_permissions: bool,
}

impl DispatchPolicy {
    /// Permissions checked at dispatch.
    pub const fn enforcing() -> Self {
        Self {
            enforce_permissions: true,
        }
    }

    /// Permissions left to the caller.
    pub const fn advisory() -> Self {
        Self {
            enforce_permissions: false,
        }
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::enforcing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_enforcing() {
        assert!(DispatchPolicy::default().enforce_permissions);
        let parsed: DispatchPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, DispatchPolicy::enforcing());
        let parsed: DispatchPolicy =
            serde_json::from_str(r#"{"enforcePermissions": false}"#).unwrap();
        assert_eq!(parsed, DispatchPolicy::advisory());
    }
}

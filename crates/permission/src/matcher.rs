//! Pure wildcard matching over permission strings.

/// Whether a single user permission satisfies a required permission.
///
/// A lone `*` matches anything. Otherwise both strings are split on `:` and
/// must have the same number of segments; each user segment must be `*` or
/// equal the corresponding required segment.
///
/// ```
/// use switchboard_permission::matches_wildcard;
///
/// assert!(matches_wildcard("users:*", "users:read"));
/// assert!(!matches_wildcard("users:*", "users:read:extra"));
/// ```
pub fn matches_wildcard(user_permission: &str, required: &str) -> bool {
    if user_permission == "*" {
        return true;
    }

    let mut held = user_permission.split(':');
    let mut wanted = required.split(':');
    loop {
        match (held.next(), wanted.next()) {
            (None, None) => return true,
            (Some(h), Some(w)) if h == "*" || h == w => {}
            _ => return false,
        }
    }
}

/// Whether any of the user's permissions satisfies `required`.
pub fn has_permission<S: AsRef<str>>(user_permissions: &[S], required: &str) -> bool {
    user_permissions.iter().any(|held| {
        let held = held.as_ref();
        held == required || matches_wildcard(held, required)
    })
}

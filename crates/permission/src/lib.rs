#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Switchboard Permission
//!
//! Permission strings are colon-delimited scopes (`resource:verb`). A user
//! permission may wildcard any segment (`objects:*`, `*:read`) and a lone `*`
//! grants everything.
//!
//! - [`matches_wildcard`] / [`has_permission`] -- the pure matcher
//! - [`PermissionConfig`] -- what a check requires (ALL/ANY, organization, bypass)
//! - [`PermissionManager`] -- runs checks, expanding role grants
//! - [`PermissionDenied`] -- why a check failed

/// What a permission check requires.
pub mod config;
/// Permission checks and role grants.
pub mod manager;
/// Wildcard permission matching.
pub mod matcher;

pub use config::PermissionConfig;
pub use manager::{Granted, PermissionDenied, PermissionManager, RoleGrants};
pub use matcher::{has_permission, matches_wildcard};

/// Permission that marks a user as a system administrator.
pub const SYSTEM_ADMIN_PERMISSION: &str = "system:admin";

/// Role names that mark a user as a system administrator.
pub const SYSTEM_ADMIN_ROLES: [&str; 2] = ["SystemAdmin", "system:admin"];

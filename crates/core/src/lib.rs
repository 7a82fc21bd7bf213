//! # Switchboard Core
//!
//! Context values shared by every Switchboard crate.
//!
//! ## Key Components
//!
//! - **User**: [`UserContext`], the signed-in principal with roles and permissions
//! - **Tenancy**: [`OrganizationContext`] and [`resolve_organization_id`]
//! - **Page**: [`PageContext`], snapshot of a page's state at invocation time
//! - **Navigation**: [`NavigationContext`] and [`Breadcrumb`]
//!
//! All of these are plain values. They are cloned into each action
//! invocation and never shared mutably.
//!
//! ## Usage
//!
//! ```rust
//! use switchboard_core::{OrganizationContext, UserContext, resolve_organization_id};
//!
//! let user = UserContext::new("u-1").with_role("Member");
//! let org = OrganizationContext::new("org-1", "Acme");
//!
//! assert_eq!(resolve_organization_id(&user, Some(&org)), Some("org-1"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// User, organization, page and navigation context.
pub mod context;

pub use context::{
    Breadcrumb, NavigationContext, OrganizationContext, PageContext, UserContext,
    resolve_organization_id,
};

/// JSON object used for free-form settings and page state.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

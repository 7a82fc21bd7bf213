#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Switchboard Pages
//!
//! The console's page controllers. Each page module exposes a constructor
//! that builds a [`PageController`](switchboard_controller::PageController)
//! over shared [`PageServices`]:
//!
//! - [`objects`]: generic record browser
//! - [`dashboard`]: tenant summary and navigation
//! - [`reports`]: group-by counts and saved reports
//! - [`workflows`]: switchable triggers for cloud functions
//! - [`functions`]: cloud function registration and invocation
//! - [`notifications`]: per-user messages
//!
//! Every query is scoped to the caller's organization. Permissions follow
//! `<page>:<verb>`.
//!
//! ```rust,ignore
//! let (services, store, functions) = PageServices::in_memory();
//! let registry = Arc::new(ControllerRegistry::new(Instrumentation::default()));
//! mount_standard_pages(&services, &registry);
//! let session = ConsoleSession::new(registry, Arc::new(standard_routes()?), user);
//! ```

/// Audit sink backed by the object store.
pub mod audit;
/// Dashboard page.
pub mod dashboard;
/// Cloud functions page.
pub mod functions;
/// Notifications page.
pub mod notifications;
/// Generic objects page.
pub mod objects;
/// Reports page.
pub mod reports;
mod routes;
mod scope;
mod services;
/// Workflows page.
pub mod workflows;

pub use audit::{AUDIT_CLASS, StoreAuditSink};
pub use routes::{mount_standard_pages, standard_pages, standard_routes};
pub use services::{DEFAULT_FUNCTION_TIMEOUT, PageServices};

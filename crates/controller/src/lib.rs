#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Switchboard Controller
//!
//! Page controllers, the controller registry, route binding and console
//! sessions.
//!
//! - [`PageController`]: one page's action table and context snapshot
//! - [`ControllerRegistry`]: mounted pages, the flattened action index, and
//!   [`execute_action`](ControllerRegistry::execute_action)
//! - [`DispatchPolicy`]: whether dispatch enforces permissions
//! - [`RouteTable`]: path patterns to page ids
//! - [`ConsoleSession`]: a user's navigation state and dispatch entry point
//!
//! Actions registered with [`PageController::register_action`] run inside an
//! execution wrapper that checks for an organization, times the executor,
//! turns errors and panics into failed results, and reports to the event bus
//! and metrics registry.

/// Page controllers and their action tables.
pub mod controller;
/// Registry and route-table errors.
pub mod error;
mod index;
/// Fixed page descriptors.
pub mod page;
/// Dispatch policy.
pub mod policy;
/// Mounted pages, the action index, and dispatch.
pub mod registry;
/// Path patterns bound to page ids.
pub mod route;
/// Per-user navigation state and dispatch entry point.
pub mod session;
/// Execution wrapper around raw executors.
pub mod wrapper;

pub use controller::PageController;
pub use error::RegistryError;
pub use page::{PageConfig, PageMetadata};
pub use policy::DispatchPolicy;
pub use registry::{ControllerRegistry, RegistryStatistics};
pub use route::{RouteMatch, RouteTable};
pub use session::ConsoleSession;
pub use wrapper::PANIC_MESSAGE;

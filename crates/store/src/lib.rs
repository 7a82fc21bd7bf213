#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Switchboard Store
//!
//! Backend ports for page controllers and their in-memory drivers:
//!
//! - [`ObjectStore`]: find / first / count / get / save / destroy over [`Query`] and [`Record`]
//! - [`CloudFunctions`]: run a named remote function
//! - [`run_with_timeout`]: the one place a call is bounded in time
//! - [`MemoryStore`] and [`MemoryFunctions`]: drivers for tests and the CLI
//!
//! All traits are `async_trait` and object-safe, suitable for use as
//! `Arc<dyn Trait>` behind dependency injection.

/// Store and function-runtime errors.
pub mod error;
/// Cloud-function port and timeouts.
pub mod functions;
/// In-memory drivers.
pub mod memory;
/// Query builder and in-memory evaluation.
pub mod query;
/// Stored records.
pub mod record;
/// Object-store port.
pub mod store;

pub use error::StoreError;
pub use functions::{CloudFunctions, run_with_timeout, with_timeout};
pub use memory::{MemoryFunctions, MemoryStore};
pub use query::{Constraint, Query, SortDirection, compare_values};
pub use record::{Record, fields};
pub use store::ObjectStore;

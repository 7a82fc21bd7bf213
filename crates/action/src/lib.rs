//! # Switchboard Action System
//!
//! Declarative, permission-gated actions exposed by console pages.
//!
//! This crate defines **what** an action is and how it talks to callers:
//! its metadata, typed parameter list, execution context and uniform
//! result. Which actions exist, and how they are dispatched and
//! instrumented, lives in `switchboard-controller`.
//!
//! ## Core Types
//!
//! - [`Action`]: object-safe trait every dispatchable action implements
//! - [`ActionExecutor`]: raw business logic, before result wrapping
//! - [`ActionMetadata`]: id, name, category, permissions, parameters
//! - [`ActionParameter`]: one typed parameter with optional validation
//! - [`ActionContext`]: per-invocation user / organization / page / navigation
//! - [`ActionResult`]: uniform success/failure envelope with timing metadata
//! - [`ActionError`]: failure taxonomy rendered into [`ActionResult::error`]
//! - [`ActionTable`]: ordered id → action map owned by a page
//! - [`ToolDefinition`]: an action described as an AI-callable tool
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchboard_action::prelude::*;
//!
//! let meta = ActionMetadata::new("objects.count", "Count Objects", "Count records of a class")
//!     .with_category(ActionCategory::Data)
//!     .with_permission("objects:read")
//!     .with_parameter(ActionParameter::string("className").required());
//!
//! let executor = |params: ActionParams, _ctx: ActionContext| async move {
//!     let class = params.required_str("className")?;
//!     Ok(serde_json::json!({ "className": class, "count": 0 }))
//! };
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Object-safe action trait.
pub mod action;
/// Per-invocation execution context.
pub mod context;
/// Failure taxonomy.
pub mod error;
/// Raw executors and the typed adapter.
pub mod executor;
/// Static action descriptors.
pub mod metadata;
/// Parameter schema, validation and typed accessors.
pub mod parameter;
/// Convenience re-exports for page authors.
pub mod prelude;
/// Uniform result envelope.
pub mod result;
/// Ordered action table.
pub mod table;
/// AI tool descriptors.
pub mod tool;

pub use action::Action;
pub use context::ActionContext;
pub use error::ActionError;
pub use executor::{ActionExecutor, TypedExecutor, ValidatedExecutor, typed, validated};
pub use metadata::{ActionCategory, ActionExample, ActionMetadata};
pub use parameter::{
    ActionParameter, ActionParams, ParamsExt, ParameterType, ValidationRule, validate_params,
};
pub use result::{ActionResult, ResultMetadata};
pub use table::ActionTable;
pub use tool::{ToolCall, ToolDefinition};

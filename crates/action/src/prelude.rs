//! Convenience re-exports for page authors.
//!
//! ```rust,ignore
//! use switchboard_action::prelude::*;
//! ```

pub use crate::action::Action;
pub use crate::context::ActionContext;
pub use crate::error::ActionError;
pub use crate::executor::{ActionExecutor, typed, validated};
pub use crate::metadata::{ActionCategory, ActionMetadata};
pub use crate::parameter::{
    ActionParameter, ActionParams, ParamsExt, ParameterType, ValidationRule, validate_params,
};
pub use crate::result::{ActionResult, ResultMetadata};
pub use crate::table::ActionTable;
pub use crate::tool::{ToolCall, ToolDefinition};

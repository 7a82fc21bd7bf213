use async_trait::async_trait;

use crate::context::ActionContext;
use crate::metadata::ActionMetadata;
use crate::parameter::{ActionParameter, ActionParams};
use crate::result::ActionResult;

/// Base trait for every dispatchable action.
///
/// Provides identity and metadata plus a uniform `execute` that always
/// resolves to an [`ActionResult`]. Failures are reported through
/// `ActionResult::error`, never by returning `Err` or panicking.
///
/// # Object Safety
///
/// This trait is object-safe. Controllers and the registry store actions as
/// `Arc<dyn Action>`.
#[async_trait]
pub trait Action: Send + Sync + 'static {
    /// Static metadata describing this action.
    fn metadata(&self) -> &ActionMetadata;

    /// Execute with the given parameters and a freshly built context.
    async fn execute(&self, params: ActionParams, context: ActionContext) -> ActionResult;

    /// Unique action id.
    fn id(&self) -> &str {
        &self.metadata().id
    }

    /// Permissions a caller must hold.
    fn required_permissions(&self) -> &[String] {
        &self.metadata().permissions
    }

    /// Declared parameters, in order.
    fn parameters(&self) -> &[ActionParameter] {
        &self.metadata().parameters
    }
}

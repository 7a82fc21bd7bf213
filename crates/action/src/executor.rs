//! Raw executors: the business logic behind an action, before the
//! controller wraps it with timing, organization checks and auditing.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::ActionContext;
use crate::error::ActionError;
use crate::parameter::{ActionParameter, ActionParams, validate_params};

/// Business logic for one action.
///
/// Returns the raw payload; the controller turns it into an
/// [`ActionResult`](crate::ActionResult). Any async closure
/// `Fn(ActionParams, ActionContext) -> impl Future<Output = Result<Value, ActionError>>`
/// is an executor.
#[async_trait]
pub trait ActionExecutor: Send + Sync + 'static {
    /// Run the business logic.
    async fn run(&self, params: ActionParams, context: ActionContext) -> Result<Value, ActionError>;
}

#[async_trait]
impl<F, Fut> ActionExecutor for F
where
    F: Fn(ActionParams, ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ActionError>> + Send + 'static,
{
    async fn run(&self, params: ActionParams, context: ActionContext) -> Result<Value, ActionError> {
        (self)(params, context).await
    }
}

/// Adapter that deserializes params into `P` and serializes the output `T`.
///
/// Created with [`typed`]. Deserialization failures become
/// [`ActionError::Validation`].
pub struct TypedExecutor<F, P, T> {
    inner: F,
    _marker: PhantomData<fn(P) -> T>,
}

/// Wrap a typed async function as an [`ActionExecutor`].
///
/// ```rust,ignore
/// #[derive(Deserialize)]
/// struct CountParams { class_name: String }
///
/// let executor = typed(|p: CountParams, _ctx| async move {
///     Ok::<_, ActionError>(p.class_name.len())
/// });
/// ```
pub fn typed<F, P, T, Fut>(inner: F) -> TypedExecutor<F, P, T>
where
    F: Fn(P, ActionContext) -> Fut + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
    Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
{
    TypedExecutor {
        inner,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, P, T, Fut> ActionExecutor for TypedExecutor<F, P, T>
where
    F: Fn(P, ActionContext) -> Fut + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
    Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
{
    async fn run(&self, params: ActionParams, context: ActionContext) -> Result<Value, ActionError> {
        let input: P = serde_json::from_value(Value::Object(params))
            .map_err(|e| ActionError::validation(e.to_string()))?;
        let output = (self.inner)(input, context).await?;
        serde_json::to_value(output)
            .map_err(|e| ActionError::execution(format!("failed to serialize output: {e}")))
    }
}

/// Adapter that checks params against declared parameters before running
/// the inner executor.
///
/// Created with [`validated`].
pub struct ValidatedExecutor<E> {
    parameters: Vec<ActionParameter>,
    inner: E,
}

/// Check params against `parameters` before handing them to `inner`.
pub fn validated<E: ActionExecutor>(parameters: Vec<ActionParameter>, inner: E) -> ValidatedExecutor<E> {
    ValidatedExecutor { parameters, inner }
}

#[async_trait]
impl<E: ActionExecutor> ActionExecutor for ValidatedExecutor<E> {
    async fn run(&self, params: ActionParams, context: ActionContext) -> Result<Value, ActionError> {
        validate_params(&self.parameters, &params)?;
        self.inner.run(params, context).await
    }
}

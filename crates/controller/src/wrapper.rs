//! Execution wrapper around raw executors.
//!
//! Every action registered through [`PageController::register_action`]
//! runs here:
//!
//! 1. Record the start instant
//! 2. Reject calls without an organization (unless the action opts out)
//! 3. Run the executor, catching both `Err` and panics
//! 4. Build the [`ActionResult`] with timing metadata
//! 5. Emit an event, record metrics, and log
//!
//! There are no retries and no timeout at this layer.
//!
//! [`PageController::register_action`]: crate::PageController::register_action

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use switchboard_action::{
    Action, ActionContext, ActionError, ActionExecutor, ActionMetadata, ActionParams,
    ActionResult, ResultMetadata,
};
use switchboard_telemetry::{ActionEvent, ActionEventKind, Instrumentation, names};

/// Message used when an executor panics.
pub const PANIC_MESSAGE: &str = "Action execution failed";

/// An executor bound to its metadata and owning page.
pub(crate) struct WrappedAction {
    metadata: ActionMetadata,
    page_id: String,
    executor: Arc<dyn ActionExecutor>,
    instrumentation: Instrumentation,
}

impl WrappedAction {
    pub(crate) fn new(
        metadata: ActionMetadata,
        page_id: String,
        executor: Arc<dyn ActionExecutor>,
        instrumentation: Instrumentation,
    ) -> Self {
        Self {
            metadata,
            page_id,
            executor,
            instrumentation,
        }
    }

    async fn run_executor(
        &self,
        params: ActionParams,
        context: ActionContext,
    ) -> Result<Value, ActionError> {
        if self.metadata.requires_organization && context.organization_id().is_none() {
            return Err(ActionError::OrganizationRequired);
        }

        match AssertUnwindSafe(self.executor.run(params, context))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                tracing::error!(
                    action_id = %self.metadata.id,
                    panic = panic_payload(panic.as_ref()),
                    "action executor panicked"
                );
                Err(ActionError::execution(PANIC_MESSAGE))
            }
        }
    }
}

#[async_trait]
impl Action for WrappedAction {
    fn metadata(&self) -> &ActionMetadata {
        &self.metadata
    }

    async fn execute(&self, params: ActionParams, context: ActionContext) -> ActionResult {
        let metrics = self.instrumentation.metrics();
        let in_flight = metrics.gauge(names::ACTIONS_IN_FLIGHT);
        let user_id = context.user.id.clone();
        let event = ActionEvent::new(
            ActionEventKind::ActionExecuted,
            &self.metadata.id,
            &self.page_id,
            &user_id,
        )
        .with_params(params.clone())
        .with_caller(
            context.user.roles.clone(),
            context.organization_id().map(str::to_owned),
        );

        let started = Instant::now();
        in_flight.inc();
        let outcome = self.run_executor(params, context).await;
        in_flight.dec();
        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        metrics
            .histogram(names::ACTION_DURATION_MS)
            .observe(elapsed.as_secs_f64() * 1000.0);
        let meta = ResultMetadata::new(&self.metadata.id, user_id, elapsed_ms);

        match outcome {
            Ok(data) => {
                metrics.counter(names::ACTIONS_EXECUTED_TOTAL).inc();
                tracing::info!(
                    action_id = %self.metadata.id,
                    page_id = %self.page_id,
                    elapsed_ms,
                    "action executed"
                );
                self.instrumentation
                    .events()
                    .emit(event.with_result(Some(data.clone())));
                ActionResult::success(
                    data,
                    format!("{} executed successfully", self.metadata.name),
                    meta,
                )
            }
            Err(error) => {
                metrics.counter(names::ACTIONS_FAILED_TOTAL).inc();
                tracing::warn!(
                    action_id = %self.metadata.id,
                    page_id = %self.page_id,
                    kind = error.kind(),
                    %error,
                    elapsed_ms,
                    "action failed"
                );
                let mut event = event.with_error(error.to_string());
                event.kind = ActionEventKind::ActionFailed;
                self.instrumentation.events().emit(event);
                ActionResult::from_error(&error, meta)
            }
        }
    }
}

fn panic_payload(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

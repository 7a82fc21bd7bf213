use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use switchboard_action::{ActionContext, ActionError, ActionExecutor, ActionMetadata, typed, validated};
use switchboard_controller::PageController;
use switchboard_store::{CloudFunctions, MemoryFunctions, MemoryStore, ObjectStore};

/// Default time limit for a single cloud-function call.
pub const DEFAULT_FUNCTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Backends shared by every page.
#[derive(Clone)]
pub struct PageServices {
    /// Record storage.
    pub store: Arc<dyn ObjectStore>,
    /// Remote function runtime.
    pub functions: Arc<dyn CloudFunctions>,
    /// Time limit applied when a function definition does not set one.
    pub function_timeout: Duration,
}

impl PageServices {
    /// Services over the given backends.
    pub fn new(store: Arc<dyn ObjectStore>, functions: Arc<dyn CloudFunctions>) -> Self {
        Self {
            store,
            functions,
            function_timeout: DEFAULT_FUNCTION_TIMEOUT,
        }
    }

    /// Services over fresh in-memory drivers, also returned for seeding.
    pub fn in_memory() -> (Self, Arc<MemoryStore>, Arc<MemoryFunctions>) {
        let store = Arc::new(MemoryStore::new());
        let functions = Arc::new(MemoryFunctions::new());
        let services = Self::new(store.clone(), functions.clone());
        (services, store, functions)
    }

    /// Change the default function timeout.
    pub fn with_function_timeout(mut self, timeout: Duration) -> Self {
        self.function_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for PageServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageServices")
            .field("function_timeout", &self.function_timeout)
            .finish_non_exhaustive()
    }
}

/// Bind a typed handler to the services it needs.
pub(crate) fn bind<P, T, Fut, F>(services: &PageServices, handler: F) -> impl ActionExecutor
where
    F: Fn(PageServices, P, ActionContext) -> Fut + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
    Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
{
    let services = services.clone();
    typed(move |params: P, context: ActionContext| handler(services.clone(), params, context))
}

/// Register an executor that first checks its declared parameters.
pub(crate) fn register<E: ActionExecutor>(page: &PageController, metadata: ActionMetadata, executor: E) {
    let parameters = metadata.parameters.clone();
    page.register_action(metadata, validated(parameters, executor));
}

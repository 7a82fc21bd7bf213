//! Wires the registry, pages and session from an [`AppConfig`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::{Value, json};
use switchboard_controller::{ConsoleSession, ControllerRegistry};
use switchboard_pages::{PageServices, StoreAuditSink, mount_standard_pages, standard_routes};
use switchboard_store::{MemoryFunctions, MemoryStore, StoreError};
use switchboard_telemetry::{AuditLogger, Instrumentation};

use crate::config::AppConfig;

/// A mounted console with one session.
pub struct Console {
    pub registry: Arc<ControllerRegistry>,
    pub session: ConsoleSession,
    audit: AuditLogger,
}

impl Console {
    pub fn start(config: &AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new());
        if let Some(path) = &config.seed {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading seed {}", path.display()))?;
            let seed: Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing seed {}", path.display()))?;
            store.load_seed(&seed)?;
        }

        let functions = Arc::new(builtin_functions());
        let services = PageServices::new(store.clone(), functions)
            .with_function_timeout(Duration::from_millis(config.function_timeout_ms));

        let registry = Arc::new(
            ControllerRegistry::new(Instrumentation::new(config.event_capacity))
                .with_policy(config.dispatch),
        );
        let audit = AuditLogger::spawn(
            registry.instrumentation().events(),
            Arc::new(StoreAuditSink::new(store.clone())),
        );
        mount_standard_pages(&services, &registry);

        let mut session = ConsoleSession::new(
            registry.clone(),
            Arc::new(standard_routes()?),
            config.session.user_context(),
        );
        session.set_organization(config.session.organization_context());

        Ok(Self {
            registry,
            session,
            audit,
        })
    }

    /// Stop the audit task and report how many events it persisted.
    pub async fn finish(self) -> u64 {
        let recorded = self.audit.shutdown().await;
        tracing::info!(recorded, "audit events persisted");
        recorded
    }
}

/// Functions available to the `functions` and `workflows` pages.
///
/// - `echo` returns its params
/// - `sleep` waits `params.ms` milliseconds
/// - `fail` always fails with `params.message`
pub fn builtin_functions() -> MemoryFunctions {
    MemoryFunctions::new()
        .with_function("echo", |request: Value| async move {
            Ok::<_, StoreError>(request["params"].clone())
        })
        .with_function("sleep", |request: Value| async move {
            let ms = request["params"]["ms"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<_, StoreError>(json!({ "sleptMs": ms }))
        })
        .with_function("fail", |request: Value| async move {
            Err::<Value, _>(StoreError::Function {
                name: "fail".into(),
                message: request["params"]["message"]
                    .as_str()
                    .unwrap_or("failed on purpose")
                    .to_owned(),
            })
        })
}

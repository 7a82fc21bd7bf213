//! Audit logging.
//!
//! An [`AuditLogger`] subscribes to the [`EventBus`], logs every event
//! through `tracing`, and forwards it to an [`AuditSink`]. Sink failures
//! are logged and swallowed; they never reach the caller of an action.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::event::{ActionEvent, ActionEventKind, EventBus, EventSubscriber};

/// Error returned by an [`AuditSink`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// The sink could not persist the event.
    #[error("audit sink failed: {0}")]
    Sink(String),
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    /// Persist one event.
    async fn record(&self, event: &ActionEvent) -> Result<(), AuditError>;
}

/// Sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<ActionEvent>>,
}

impl MemoryAuditSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded event, oldest first.
    pub fn events(&self) -> Vec<ActionEvent> {
        self.events.lock().clone()
    }

    /// Recorded events of one kind.
    pub fn of_kind(&self, kind: ActionEventKind) -> Vec<ActionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: &ActionEvent) -> Result<(), AuditError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Background task draining an [`EventBus`] into an [`AuditSink`].
///
/// Must be spawned inside a tokio runtime. The subscription is taken
/// synchronously in [`spawn`](Self::spawn), so events emitted after it
/// returns are never missed.
///
/// ```rust,ignore
/// let sink = Arc::new(MemoryAuditSink::new());
/// let logger = AuditLogger::spawn(&bus, sink.clone());
/// // ... dispatch actions ...
/// let recorded = logger.shutdown().await;
/// ```
pub struct AuditLogger {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<u64>,
}

impl AuditLogger {
    /// Subscribe to `bus` and start forwarding to `sink`.
    pub fn spawn(bus: &EventBus, sink: Arc<dyn AuditSink>) -> Self {
        let subscriber = bus.subscribe();
        let (stop, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(run(subscriber, sink, stop_rx));
        Self {
            stop: Some(stop),
            handle,
        }
    }

    /// Drain pending events, stop the task, and return how many events
    /// were forwarded.
    pub async fn shutdown(mut self) -> u64 {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match (&mut self.handle).await {
            Ok(recorded) => recorded,
            Err(error) => {
                tracing::error!(%error, "audit logger task failed");
                0
            }
        }
    }
}

impl Drop for AuditLogger {
    fn drop(&mut self) {
        if self.stop.is_some() {
            self.handle.abort();
        }
    }
}

async fn run(
    mut subscriber: EventSubscriber,
    sink: Arc<dyn AuditSink>,
    mut stop: oneshot::Receiver<()>,
) -> u64 {
    let mut recorded = 0;
    loop {
        tokio::select! {
            biased;
            event = subscriber.recv() => match event {
                Some(event) => recorded += forward(sink.as_ref(), &event).await,
                None => break,
            },
            _ = &mut stop => {
                while let Some(event) = subscriber.try_recv() {
                    recorded += forward(sink.as_ref(), &event).await;
                }
                break;
            }
        }
    }
    tracing::debug!(recorded, "audit logger stopped");
    recorded
}

async fn forward(sink: &dyn AuditSink, event: &ActionEvent) -> u64 {
    match event.kind {
        ActionEventKind::ActionExecuted => tracing::info!(
            target: "switchboard::audit",
            event_id = %event.event_id,
            kind = event.kind.as_str(),
            action_id = %event.action_id,
            page_id = %event.page_id,
            user_id = %event.user_id,
            "action audited"
        ),
        ActionEventKind::ActionFailed | ActionEventKind::PermissionDenied => tracing::warn!(
            target: "switchboard::audit",
            event_id = %event.event_id,
            kind = event.kind.as_str(),
            action_id = %event.action_id,
            page_id = %event.page_id,
            user_id = %event.user_id,
            error = event.error.as_deref().unwrap_or_default(),
            "action audited"
        ),
    }

    match sink.record(event).await {
        Ok(()) => 1,
        Err(error) => {
            tracing::warn!(%error, event_id = %event.event_id, "audit sink rejected event");
            0
        }
    }
}

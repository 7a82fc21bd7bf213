//! Shared handles to the event bus and metrics registry.

use std::sync::Arc;

use crate::event::EventBus;
use crate::metrics::MetricsRegistry;

/// Event bus and metrics registry, cloned into every controller.
///
/// Cloning is cheap: both halves are reference-counted, so every clone
/// emits to the same bus and records into the same registry.
///
/// # Examples
///
/// ```
/// use switchboard_telemetry::Instrumentation;
///
/// let instrumentation = Instrumentation::new(64);
/// let counter = instrumentation.metrics().counter("test");
/// counter.inc();
/// assert_eq!(instrumentation.clone().metrics().counter("test").get(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Instrumentation {
    events: Arc<EventBus>,
    metrics: MetricsRegistry,
}

impl Instrumentation {
    /// New bus with the given capacity and an empty registry.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        Self {
            events: Arc::new(EventBus::new(event_capacity)),
            metrics: MetricsRegistry::new(),
        }
    }

    /// Use existing handles.
    #[must_use]
    pub fn from_parts(events: Arc<EventBus>, metrics: MetricsRegistry) -> Self {
        Self { events, metrics }
    }

    /// The event bus.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// The metrics registry.
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }
}

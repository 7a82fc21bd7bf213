#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Switchboard Telemetry
//!
//! Action events, audit logging, and metrics.
//!
//! This crate provides:
//! - [`ActionEvent`]: one record per dispatch outcome
//! - [`EventBus`]: broadcast-based event distribution
//! - [`AuditLogger`]: background task draining the bus into an [`AuditSink`]
//! - [`MetricsRegistry`]: in-memory counters, gauges and histograms
//! - [`Instrumentation`]: the bus and registry handed to every controller
//!
//! Events are **projections**. Dropping them never affects the result a
//! caller receives from an action.

/// Audit sinks and the logger task.
pub mod audit;
/// Action events and the broadcast bus.
pub mod event;
/// Event bus plus metrics, handed to controllers.
pub mod instrumentation;
/// Counters, gauges and histograms.
pub mod metrics;

pub use audit::{AuditError, AuditLogger, AuditSink, MemoryAuditSink};
pub use event::{
    ActionEvent, ActionEventData, ActionEventKind, DEFAULT_CAPACITY, EventBus, EventSubscriber,
};
pub use instrumentation::Instrumentation;
pub use metrics::{
    Counter, Gauge, Histogram, HistogramSummary, MetricsRegistry, MetricsSnapshot, names,
};

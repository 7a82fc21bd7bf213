//! Event bus for action lifecycle events.
//!
//! Uses [`tokio::sync::broadcast`] for fan-out delivery to multiple subscribers.
//! Events are fire-and-forget projections -- dropping them is acceptable.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use switchboard_core::JsonMap;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default channel capacity for [`EventBus::default`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// What happened to a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionEventKind {
    /// The executor ran and succeeded.
    ActionExecuted,
    /// The executor failed, panicked, or the organization check rejected it.
    ActionFailed,
    /// Dispatch rejected the caller before the executor ran.
    PermissionDenied,
}

impl ActionEventKind {
    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ActionExecuted => "action_executed",
            Self::ActionFailed => "action_failed",
            Self::PermissionDenied => "permission_denied",
        }
    }
}

/// Payload of an [`ActionEvent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEventData {
    /// Parameters the action was called with.
    #[serde(default)]
    pub params: JsonMap,
    /// Data returned on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Roles of the calling user.
    #[serde(default)]
    pub user_roles: Vec<String>,
    /// Organization the call was made in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

/// One dispatch outcome.
///
/// These events are emitted by controllers and the registry as actions
/// run. They are projections, **not** the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    /// Unique id of this event.
    pub event_id: Uuid,
    /// Outcome.
    pub kind: ActionEventKind,
    /// Action that was dispatched.
    pub action_id: String,
    /// Page owning the action.
    pub page_id: String,
    /// Calling user.
    pub user_id: String,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Call details.
    pub data: ActionEventData,
    /// Failure message for `action_failed` and `permission_denied`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionEvent {
    /// New event with empty data.
    pub fn new(
        kind: ActionEventKind,
        action_id: impl Into<String>,
        page_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind,
            action_id: action_id.into(),
            page_id: page_id.into(),
            user_id: user_id.into(),
            timestamp: Utc::now(),
            data: ActionEventData::default(),
            error: None,
        }
    }

    /// Attach call parameters.
    pub fn with_params(mut self, params: JsonMap) -> Self {
        self.data.params = params;
        self
    }

    /// Attach the success payload.
    pub fn with_result(mut self, result: Option<serde_json::Value>) -> Self {
        self.data.result = result;
        self
    }

    /// Attach the caller's roles and organization.
    pub fn with_caller(mut self, roles: Vec<String>, organization_id: Option<String>) -> Self {
        self.data.user_roles = roles;
        self.data.organization_id = organization_id;
        self
    }

    /// Attach a failure message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Broadcast-based event bus.
///
/// Delivers events to all active subscribers. If no subscribers are
/// listening, events are silently dropped (fire-and-forget).
///
/// # Examples
///
/// ```
/// use switchboard_telemetry::event::{ActionEvent, ActionEventKind, EventBus};
///
/// let bus = EventBus::new(64);
/// let mut sub = bus.subscribe();
///
/// bus.emit(ActionEvent::new(ActionEventKind::ActionExecuted, "objects.list", "objects", "u-1"));
///
/// assert_eq!(bus.total_emitted(), 1);
/// assert!(sub.try_recv().is_some());
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ActionEvent>,
    emitted: AtomicU64,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    ///
    /// When the channel is full, the oldest events are dropped (lagging
    /// subscribers skip past them).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            emitted: AtomicU64::new(0),
        }
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns silently if there are no active subscribers.
    pub fn emit(&self, event: ActionEvent) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        // Ignore send error (no active receivers).
        let _ = self.sender.send(event);
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Total number of events emitted since creation.
    #[must_use]
    pub fn total_emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("emitted", &self.total_emitted())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Subscription handle for receiving events from the [`EventBus`].
pub struct EventSubscriber {
    receiver: broadcast::Receiver<ActionEvent>,
}

impl EventSubscriber {
    /// Receive the next event, waiting asynchronously.
    ///
    /// Returns `None` once the bus has been dropped. Lagged events are
    /// skipped.
    pub async fn recv(&mut self) -> Option<ActionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without blocking.
    ///
    /// Returns `None` if no event is immediately available.
    pub fn try_recv(&mut self) -> Option<ActionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}

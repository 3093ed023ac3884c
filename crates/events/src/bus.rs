//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`PlatformEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use intake_core::job::JobType;
use intake_core::types::{EnvironmentId, JobId, SheetId, SpaceId, Timestamp, WorkbookId};

// ---------------------------------------------------------------------------
// EventTopic
// ---------------------------------------------------------------------------

/// Topic of a platform event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// `job:ready` -- a job is waiting for a worker.
    JobReady,
    /// `commit:created` -- records were written to a sheet.
    CommitCreated,
    Other(String),
}

impl EventTopic {
    pub fn parse(s: &str) -> Self {
        match s {
            "job:ready" => EventTopic::JobReady,
            "commit:created" => EventTopic::CommitCreated,
            other => EventTopic::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventTopic::JobReady => "job:ready",
            EventTopic::CommitCreated => "commit:created",
            EventTopic::Other(s) => s,
        }
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventTopic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventTopic {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventTopic::parse(&s))
    }
}

// ---------------------------------------------------------------------------
// EventContext
// ---------------------------------------------------------------------------

/// Identifiers describing where an event happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventContext {
    /// Namespaces of the space the event belongs to, e.g. `space:red`.
    pub namespaces: Vec<String>,
    pub job_id: Option<JobId>,
    /// Job type, present on `job:*` topics.
    pub job: Option<JobType>,
    pub workbook_id: Option<WorkbookId>,
    pub space_id: Option<SpaceId>,
    pub environment_id: Option<EnvironmentId>,
    pub sheet_id: Option<SheetId>,
    pub sheet_slug: Option<String>,
}

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

fn now() -> Timestamp {
    Utc::now()
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

/// An event delivered by the platform.
///
/// Constructed via [`PlatformEvent::new`] and enriched with
/// [`with_context`](PlatformEvent::with_context) and
/// [`with_payload`](PlatformEvent::with_payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEvent {
    pub topic: EventTopic,

    #[serde(default)]
    pub context: EventContext,

    /// Free-form JSON payload carrying event-specific data.
    #[serde(default = "empty_object")]
    pub payload: serde_json::Value,

    /// When the event was received (UTC).
    #[serde(default = "now")]
    pub timestamp: Timestamp,
}

impl PlatformEvent {
    /// Create a new event with an empty context and payload.
    pub fn new(topic: EventTopic) -> Self {
        Self {
            topic,
            context: EventContext::default(),
            payload: empty_object(),
            timestamp: now(),
        }
    }

    /// A `job:ready` event for a workbook-scoped job.
    pub fn job_ready(job_id: &str, job: JobType, workbook_id: &str) -> Self {
        Self::new(EventTopic::JobReady).with_context(EventContext {
            job_id: Some(job_id.to_string()),
            job: Some(job),
            workbook_id: Some(workbook_id.to_string()),
            ..Default::default()
        })
    }

    /// A `commit:created` event for one sheet.
    pub fn commit_created(sheet_id: &str, sheet_slug: &str) -> Self {
        Self::new(EventTopic::CommitCreated).with_context(EventContext {
            sheet_id: Some(sheet_id.to_string()),
            sheet_slug: Some(sheet_slug.to_string()),
            ..Default::default()
        })
    }

    pub fn with_context(mut self, context: EventContext) -> Self {
        self.context = context;
        self
    }

    /// Add a namespace to the event context.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.context.namespaces.push(namespace.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`PlatformEvent`].
///
/// # Usage
///
/// ```rust
/// use intake_events::bus::{EventBus, EventTopic, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new(EventTopic::JobReady));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it; with zero
    /// subscribers the event is dropped.
    pub fn publish(&self, event: PlatformEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

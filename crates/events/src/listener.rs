//! Typed handler registration and the event dispatch loop.
//!
//! A [`Listener`] holds `(EventFilter, handler)` pairs. For every event it
//! runs each matching handler in registration order and awaits it to
//! completion before looking at the next handler or event.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use intake_core::job::JobType;

use crate::bus::{EventTopic, PlatformEvent};

/// Topic pattern that matches every topic.
pub const ANY_TOPIC: &str = "**";

/// Something that reacts to platform events.
///
/// Handlers own their failure handling: nothing is returned to the
/// dispatcher.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name used in dispatch logs.
    fn name(&self) -> &str;

    async fn handle(&self, event: &PlatformEvent);
}

// ---------------------------------------------------------------------------
// EventFilter
// ---------------------------------------------------------------------------

/// Selects which events a handler sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    /// `None` matches every topic.
    topic: Option<EventTopic>,
    job: Option<JobType>,
    namespace: Option<String>,
}

impl EventFilter {
    /// Match every event.
    pub fn any() -> Self {
        Self {
            topic: None,
            job: None,
            namespace: None,
        }
    }

    pub fn topic(topic: EventTopic) -> Self {
        Self {
            topic: Some(topic),
            ..Self::any()
        }
    }

    /// Build from a topic pattern: [`ANY_TOPIC`] or a literal topic.
    pub fn parse(pattern: &str) -> Self {
        if pattern == ANY_TOPIC {
            Self::any()
        } else {
            Self::topic(EventTopic::parse(pattern))
        }
    }

    /// Only match events whose context carries this job type.
    pub fn job(mut self, job: JobType) -> Self {
        self.job = Some(job);
        self
    }

    /// Only match events from a space in this namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn matches(&self, event: &PlatformEvent) -> bool {
        let topic_ok = self.topic.as_ref().is_none_or(|t| *t == event.topic);
        let job_ok = self
            .job
            .as_ref()
            .is_none_or(|j| event.context.job.as_ref() == Some(j));
        let namespace_ok = self
            .namespace
            .as_ref()
            .is_none_or(|ns| event.context.namespaces.iter().any(|n| n == ns));
        topic_ok && job_ok && namespace_ok
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Ordered set of filtered handlers.
#[derive(Default)]
pub struct Listener {
    handlers: Vec<(EventFilter, Arc<dyn EventHandler>)>,
}

impl Listener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events matching `filter`.
    pub fn on(mut self, filter: EventFilter, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push((filter, handler));
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run every matching handler for `event`, in registration order.
    ///
    /// Returns how many handlers ran.
    pub async fn dispatch(&self, event: &PlatformEvent) -> usize {
        let mut ran = 0;
        for (filter, handler) in &self.handlers {
            if !filter.matches(event) {
                continue;
            }
            tracing::debug!(handler = handler.name(), topic = %event.topic, "Dispatching event");
            handler.handle(event).await;
            ran += 1;
        }
        ran
    }

    /// Run the dispatch loop.
    ///
    /// Exits when `cancel` fires or the bus is dropped.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) {
        tracing::info!(handlers = self.handlers.len(), "Event listener started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Event listener shutting down");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        let ran = self.dispatch(&event).await;
                        if ran == 0 {
                            tracing::debug!(topic = %event.topic, "No handler matched event");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Event listener lagged, some events were dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, listener shutting down");
                        break;
                    }
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

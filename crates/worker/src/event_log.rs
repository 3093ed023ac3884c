//! Catch-all handler that logs every event the worker receives.

use async_trait::async_trait;

use intake_events::{EventHandler, PlatformEvent};

pub struct EventLogger;

#[async_trait]
impl EventHandler for EventLogger {
    fn name(&self) -> &str {
        "event-log"
    }

    async fn handle(&self, event: &PlatformEvent) {
        tracing::info!(
            topic = %event.topic,
            job = ?event.context.job.as_ref().map(|j| j.as_str()),
            job_id = ?event.context.job_id,
            namespaces = ?event.context.namespaces,
            "Received event: {}",
            event.topic,
        );
    }
}

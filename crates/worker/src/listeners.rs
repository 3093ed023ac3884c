//! Handler registration for the worker.
//!
//! | Filter                                             | Handler               |
//! |----------------------------------------------------|-----------------------|
//! | `**`                                               | [`EventLogger`]       |
//! | `commit:created` in `namespace`                    | [`RecordHook`] (contacts) |
//! | `job:ready`, job `workbook:submitAction`, in `namespace` | [`SubmitJobController`] |

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use intake_core::error::CoreError;
use intake_core::job::JobType;
use intake_core::platform::PlatformApi;
use intake_events::{DeliveryTarget, EventFilter, EventTopic, Listener, ANY_TOPIC};

use crate::event_log::EventLogger;
use crate::ingest::RecordHook;
use crate::submit::{SubmitConfig, SubmitJobController};

/// Build the worker's listener.
pub fn build_listener(
    namespace: &str,
    platform: Arc<dyn PlatformApi>,
    delivery: Arc<dyn DeliveryTarget>,
    submit: SubmitConfig,
) -> Result<Listener, CoreError> {
    let hook = RecordHook::contacts(Arc::clone(&platform))?;
    let controller = SubmitJobController::new(platform, delivery, submit);

    Ok(Listener::new()
        .on(EventFilter::parse(ANY_TOPIC), Arc::new(EventLogger))
        .on(
            EventFilter::topic(EventTopic::CommitCreated).namespace(namespace),
            Arc::new(hook),
        )
        .on(
            EventFilter::topic(EventTopic::JobReady)
                .job(JobType::WorkbookSubmitAction)
                .namespace(namespace),
            Arc::new(controller),
        ))
}

/// How the listener task ended during shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Finished its queued events and exited on its own.
    Drained,
    /// Still busy after the grace period; cancelled and aborted.
    Aborted,
    /// The task panicked.
    Panicked,
}

/// Wait up to `grace` for the listener task to exit, then cancel and abort
/// it. Returns only once the task is gone.
pub async fn drain_listener(
    mut handle: JoinHandle<()>,
    cancel: &CancellationToken,
    grace: Duration,
) -> DrainOutcome {
    let joined = match tokio::time::timeout(grace, &mut handle).await {
        Ok(joined) => joined,
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs_f64(),
                "Listener did not drain in time, aborting"
            );
            cancel.cancel();
            handle.abort();
            handle.await
        }
    };

    match joined {
        Ok(()) => DrainOutcome::Drained,
        Err(e) if e.is_cancelled() => DrainOutcome::Aborted,
        Err(e) => {
            tracing::error!(error = %e, "Listener task panicked");
            DrainOutcome::Panicked
        }
    }
}

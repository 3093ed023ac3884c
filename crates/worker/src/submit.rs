//! Submit job controller.
//!
//! Drives one `workbook:submitAction` job through
//! `ready -> acknowledged -> delivering -> completed | failed`:
//! acknowledge, collect every sheet's records, POST them once to the
//! configured webhook, then report exactly one terminal status.
//!
//! Every fault between acknowledge and delivery is caught here. The typed
//! [`SubmitFailure`] goes to the logs and the returned [`SubmitReport`]; the
//! user only ever sees the generic failure message.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use intake_core::job::{JobAck, JobOutcome, SubmitJobState, ACK_PROGRESS};
use intake_core::platform::{PlatformApi, PlatformError, Sheet};
use intake_core::record::Record;
use intake_core::types::{JobId, WorkbookId};
use intake_events::{DeliveryTarget, EventHandler, PlatformEvent, WebhookError};

/// Tag added to every delivery body as `"method"`.
pub const DEFAULT_METHOD_TAG: &str = "reqwest";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Controller settings fixed at construction.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub method_tag: String,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            method_tag: DEFAULT_METHOD_TAG.to_string(),
        }
    }
}

/// One submit job as announced by a `job:ready` event.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitJob {
    pub job_id: JobId,
    pub workbook_id: Option<WorkbookId>,
    /// Original event payload, spread into the delivery body.
    pub payload: Value,
}

impl SubmitJob {
    /// Extract the job from an event. `None` when the event has no job id,
    /// since there is then nothing to report a status against.
    pub fn from_event(event: &PlatformEvent) -> Option<Self> {
        Some(Self {
            job_id: event.context.job_id.clone()?,
            workbook_id: event.context.workbook_id.clone(),
            payload: event.payload.clone(),
        })
    }
}

/// Why a submit job failed.
#[derive(Debug, thiserror::Error)]
pub enum SubmitFailure {
    #[error("acknowledge failed: {0}")]
    Acknowledge(#[source] PlatformError),

    #[error("job context has no workbook id")]
    MissingWorkbook,

    #[error("collection failed: {0}")]
    Collection(#[source] PlatformError),

    #[error("could not encode delivery body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("delivery failed: {0}")]
    Delivery(#[source] WebhookError),

    #[error("webhook returned HTTP {0}")]
    Non200(u16),
}

impl From<WebhookError> for SubmitFailure {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::HttpStatus(status) => SubmitFailure::Non200(status),
            other => SubmitFailure::Delivery(other),
        }
    }
}

/// Result of one controller run.
#[derive(Debug)]
pub struct SubmitReport {
    pub job_id: JobId,
    /// Every state the job passed through, starting with `Ready` and
    /// ending in a terminal state.
    pub transitions: Vec<SubmitJobState>,
    pub failure: Option<SubmitFailure>,
    pub sheet_count: usize,
    pub record_count: usize,
    /// Whether the terminal call reached the job system.
    pub reported: bool,
}

impl SubmitReport {
    pub fn state(&self) -> SubmitJobState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(SubmitJobState::Ready)
    }
}

/// Sheets and their records, keyed `Sheet[i]` in workbook order.
struct Collected {
    sheets: Vec<Sheet>,
    records: IndexMap<String, Vec<Record>>,
}

impl Collected {
    fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct SubmitJobController {
    platform: Arc<dyn PlatformApi>,
    delivery: Arc<dyn DeliveryTarget>,
    config: SubmitConfig,
}

impl SubmitJobController {
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        delivery: Arc<dyn DeliveryTarget>,
        config: SubmitConfig,
    ) -> Self {
        Self {
            platform,
            delivery,
            config,
        }
    }

    /// User-facing message for a completed job.
    pub fn success_message(&self) -> String {
        format!(
            "Data was successfully submitted to {}. Go check it out at {}.",
            self.delivery.destination(),
            self.delivery.url()
        )
    }

    /// User-facing message for a failed job, whatever the cause.
    pub fn failure_message(&self) -> String {
        format!("This job failed. Check your {}.", self.delivery.url())
    }

    /// Run the job to a terminal state. Never returns an error.
    pub async fn run(&self, job: SubmitJob) -> SubmitReport {
        let mut report = SubmitReport {
            job_id: job.job_id.clone(),
            transitions: vec![SubmitJobState::Ready],
            failure: None,
            sheet_count: 0,
            record_count: 0,
            reported: false,
        };

        tracing::info!(job_id = %job.job_id, workbook_id = ?job.workbook_id, "Submit job started");

        match self.execute(&job, &mut report).await {
            Ok(()) => {
                advance(&mut report, SubmitJobState::Completed);
                let outcome = JobOutcome::new(self.success_message());
                match self.platform.complete(&job.job_id, outcome).await {
                    Ok(()) => report.reported = true,
                    Err(e) => {
                        tracing::error!(job_id = %job.job_id, error = %e, "Failed to report job completion");
                    }
                }
                tracing::info!(
                    job_id = %job.job_id,
                    sheets = report.sheet_count,
                    records = report.record_count,
                    "Submit job completed",
                );
            }
            Err(failure) => {
                advance(&mut report, SubmitJobState::Failed);
                tracing::error!(job_id = %job.job_id, error = %failure, "Submit job failed");
                let outcome = JobOutcome::new(self.failure_message());
                match self.platform.fail(&job.job_id, outcome).await {
                    Ok(()) => report.reported = true,
                    Err(e) => {
                        tracing::error!(job_id = %job.job_id, error = %e, "Failed to report job failure");
                    }
                }
                report.failure = Some(failure);
            }
        }

        debug_assert!(
            report.state().is_terminal(),
            "submit run ended in {:?}",
            report.state()
        );
        report
    }

    /// Ack, collect and deliver. Any error ends the job as failed.
    async fn execute(&self, job: &SubmitJob, report: &mut SubmitReport) -> Result<(), SubmitFailure> {
        let ack = JobAck {
            info: format!(
                "Starting job to submit action to {}",
                self.delivery.destination()
            ),
            progress: ACK_PROGRESS,
        };
        self.platform
            .ack(&job.job_id, ack)
            .await
            .map_err(SubmitFailure::Acknowledge)?;
        advance(report, SubmitJobState::Acknowledged);

        let workbook_id = job
            .workbook_id
            .as_ref()
            .ok_or(SubmitFailure::MissingWorkbook)?;
        let collected = self.collect(workbook_id).await?;
        report.sheet_count = collected.sheets.len();
        report.record_count = collected.record_count();
        tracing::debug!(
            job_id = %job.job_id,
            sheets = report.sheet_count,
            records = report.record_count,
            "Collected workbook data",
        );

        advance(report, SubmitJobState::Delivering);
        let body = delivery_body(&job.payload, &self.config.method_tag, &collected)?;
        self.delivery.deliver(&body).await?;
        Ok(())
    }

    /// Fetch each sheet's records sequentially, in sheet order.
    async fn collect(&self, workbook_id: &WorkbookId) -> Result<Collected, SubmitFailure> {
        let sheets = self
            .platform
            .list(workbook_id)
            .await
            .map_err(SubmitFailure::Collection)?;

        let mut records = IndexMap::with_capacity(sheets.len());
        for (index, sheet) in sheets.iter().enumerate() {
            let sheet_records = self
                .platform
                .get(&sheet.id)
                .await
                .map_err(SubmitFailure::Collection)?;
            records.insert(format!("Sheet[{index}]"), sheet_records);
        }

        Ok(Collected { sheets, records })
    }
}

fn advance(report: &mut SubmitReport, next: SubmitJobState) {
    debug_assert!(
        report.state().can_transition_to(next),
        "illegal submit transition {:?} -> {next:?}",
        report.state()
    );
    report.transitions.push(next);
}

/// `{...payload, "method": tag, "sheets": [..], "records": {"Sheet[i]": [..]}}`.
///
/// Non-object payloads contribute no keys.
fn delivery_body(payload: &Value, method_tag: &str, collected: &Collected) -> Result<Value, SubmitFailure> {
    let mut body = match payload {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    body.insert("method".to_string(), Value::String(method_tag.to_string()));
    body.insert("sheets".to_string(), serde_json::to_value(&collected.sheets)?);
    body.insert("records".to_string(), serde_json::to_value(&collected.records)?);
    Ok(Value::Object(body))
}

#[async_trait]
impl EventHandler for SubmitJobController {
    fn name(&self) -> &str {
        "submit-action"
    }

    async fn handle(&self, event: &PlatformEvent) {
        match SubmitJob::from_event(event) {
            Some(job) => {
                self.run(job).await;
            }
            None => {
                tracing::warn!(topic = %event.topic, "Submit event has no job id, ignoring");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collected() -> Collected {
        let sheet = Sheet {
            id: "sh_1".to_string(),
            workbook_id: "wb_1".to_string(),
            name: "Contacts".to_string(),
            slug: Some("contacts".to_string()),
        };
        let mut records = IndexMap::new();
        records.insert(
            "Sheet[0]".to_string(),
            vec![Record::new("rc_1").with_value("firstName", "Ada")],
        );
        Collected {
            sheets: vec![sheet],
            records,
        }
    }

    #[test]
    fn body_spreads_payload_and_adds_keys() {
        let payload = json!({"operation": "submitAction", "method": "overwritten"});
        let body = delivery_body(&payload, "reqwest", &collected()).unwrap();

        assert_eq!(body["operation"], "submitAction");
        assert_eq!(body["method"], "reqwest");
        assert_eq!(body["sheets"][0]["id"], "sh_1");
        assert_eq!(body["records"]["Sheet[0]"][0]["values"]["firstName"], "Ada");
    }

    #[test]
    fn body_ignores_non_object_payload() {
        let body = delivery_body(&json!("scalar"), "reqwest", &collected()).unwrap();
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn webhook_status_maps_to_non_200() {
        let failure = SubmitFailure::from(WebhookError::HttpStatus(500));
        assert!(matches!(failure, SubmitFailure::Non200(500)));
    }

    #[test]
    fn from_event_requires_job_id() {
        let event = PlatformEvent::new(intake_events::EventTopic::JobReady);
        assert!(SubmitJob::from_event(&event).is_none());

        let event = PlatformEvent::job_ready(
            "job_1",
            intake_core::job::JobType::WorkbookSubmitAction,
            "wb_1",
        )
        .with_payload(json!({"k": 1}));
        let job = SubmitJob::from_event(&event).unwrap();
        assert_eq!(job.workbook_id.as_deref(), Some("wb_1"));
        assert_eq!(job.payload, json!({"k": 1}));
    }
}

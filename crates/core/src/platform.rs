//! Collaborator traits for the hosted platform API.
//!
//! The submit controller and the record hook only ever talk to the
//! platform through these traits. `intake-platform` provides the REST
//! implementation and an in-memory one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::job::{JobAck, JobOutcome};
use crate::record::Record;
use crate::types::{JobId, SheetId, WorkbookId};

/// Sheet metadata as listed for a workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub id: SheetId,
    pub workbook_id: WorkbookId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Errors surfaced by any platform collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The request never produced a response (network, DNS, TLS, ...).
    #[error("Platform request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The platform answered with a non-2xx status.
    #[error("Platform API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("Unexpected platform response: {0}")]
    Decode(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
}

#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Report that work on the job has started. Advisory telemetry.
    async fn ack(&self, job_id: &JobId, ack: JobAck) -> Result<(), PlatformError>;

    async fn complete(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), PlatformError>;

    async fn fail(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), PlatformError>;
}

#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Sheets of a workbook, in workbook order.
    async fn list(&self, workbook_id: &WorkbookId) -> Result<Vec<Sheet>, PlatformError>;
}

#[async_trait]
pub trait RecordsApi: Send + Sync {
    async fn get(&self, sheet_id: &SheetId) -> Result<Vec<Record>, PlatformError>;

    /// Write back values and errors for existing records.
    async fn update(&self, sheet_id: &SheetId, records: &[Record]) -> Result<(), PlatformError>;
}

/// Everything the workers need from the platform.
pub trait PlatformApi: JobsApi + SheetsApi + RecordsApi {}

impl<T: JobsApi + SheetsApi + RecordsApi> PlatformApi for T {}

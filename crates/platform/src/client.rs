//! REST client for the hosted platform API.
//!
//! Implements the [`JobsApi`], [`SheetsApi`] and [`RecordsApi`]
//! collaborator traits over HTTP using [`reqwest`]. Every request carries
//! the platform secret as a bearer token.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use intake_core::job::{JobAck, JobOutcome};
use intake_core::platform::{JobsApi, PlatformError, RecordsApi, Sheet, SheetsApi};
use intake_core::record::Record;
use intake_core::types::{JobId, SheetId, WorkbookId};

/// `{"data": ...}` envelope used by every platform response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    records: Vec<Record>,
}

/// HTTP client for one platform environment.
#[derive(Clone)]
pub struct PlatformClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl PlatformClient {
    /// Create a new client.
    ///
    /// * `api_url` - Base URL, e.g. `https://platform.flatfile.com/api/v1`.
    /// * `api_key` - Secret key used as the bearer token.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, api_key)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn post_job(
        &self,
        job_id: &JobId,
        action: &str,
        body: &serde_json::Value,
    ) -> Result<(), PlatformError> {
        tracing::debug!(job_id = %job_id, action, "Posting job update");

        let response = self
            .client
            .post(self.url(&format!("/jobs/{job_id}/{action}")))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    // ---- private helpers ----

    /// Return the response unchanged on a 2xx status, or a
    /// [`PlatformError::Api`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PlatformError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful `{"data": ...}` response body.
    async fn parse_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PlatformError> {
        let response = Self::ensure_success(response).await?;
        let envelope = response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }
}

fn transport(err: reqwest::Error) -> PlatformError {
    PlatformError::Transport(Box::new(err))
}

#[async_trait]
impl JobsApi for PlatformClient {
    async fn ack(&self, job_id: &JobId, ack: JobAck) -> Result<(), PlatformError> {
        let body = serde_json::json!({
            "info": ack.info,
            "progress": ack.progress,
        });
        self.post_job(job_id, "ack", &body).await
    }

    async fn complete(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), PlatformError> {
        let body = serde_json::json!({ "outcome": outcome });
        self.post_job(job_id, "complete", &body).await
    }

    async fn fail(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), PlatformError> {
        let body = serde_json::json!({ "outcome": outcome });
        self.post_job(job_id, "fail", &body).await
    }
}

#[async_trait]
impl SheetsApi for PlatformClient {
    async fn list(&self, workbook_id: &WorkbookId) -> Result<Vec<Sheet>, PlatformError> {
        let response = self
            .client
            .get(self.url("/sheets"))
            .query(&[("workbookId", workbook_id.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport)?;

        Self::parse_data(response).await
    }
}

#[async_trait]
impl RecordsApi for PlatformClient {
    async fn get(&self, sheet_id: &SheetId) -> Result<Vec<Record>, PlatformError> {
        let response = self
            .client
            .get(self.url(&format!("/sheets/{sheet_id}/records")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport)?;

        let page: RecordPage = Self::parse_data(response).await?;
        tracing::debug!(sheet_id = %sheet_id, count = page.records.len(), "Fetched records");
        Ok(page.records)
    }

    async fn update(&self, sheet_id: &SheetId, records: &[Record]) -> Result<(), PlatformError> {
        let response = self
            .client
            .put(self.url(&format!("/sheets/{sheet_id}/records")))
            .bearer_auth(&self.api_key)
            .json(records)
            .send()
            .await
            .map_err(transport)?;

        Self::ensure_success(response).await?;
        Ok(())
    }
}

//! One-shot webhook delivery.
//!
//! [`WebhookDelivery`] POSTs a JSON body to a configured URL exactly once.
//! Only HTTP 200 counts as success; any other status, or a request that
//! never got a response, is an error. There is no retry.

use async_trait::async_trait;
use reqwest::StatusCode;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server answered with something other than 200.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// DeliveryTarget
// ---------------------------------------------------------------------------

/// An outbound endpoint that accepts submitted workbook data.
#[async_trait]
pub trait DeliveryTarget: Send + Sync {
    /// Human-readable destination name used in job messages.
    fn destination(&self) -> &str;

    /// The endpoint URL.
    fn url(&self) -> &str;

    /// Make a single delivery attempt.
    async fn deliver(&self, body: &serde_json::Value) -> Result<(), WebhookError>;
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers JSON bodies to one webhook endpoint.
pub struct WebhookDelivery {
    client: reqwest::Client,
    url: String,
    destination: String,
}

impl WebhookDelivery {
    /// Create a delivery target for `url`.
    ///
    /// `destination` names the receiver in user-facing job messages
    /// (e.g. `webhook.site`).
    pub fn new(url: impl Into<String>, destination: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("intake-worker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, url, destination))
    }

    /// Create a delivery target reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            destination: destination.into(),
        }
    }
}

#[async_trait]
impl DeliveryTarget for WebhookDelivery {
    fn destination(&self) -> &str {
        &self.destination
    }

    fn url(&self) -> &str {
        &self.url
    }

    async fn deliver(&self, body: &serde_json::Value) -> Result<(), WebhookError> {
        // `.json()` sets `Content-Type: application/json`.
        let response = self.client.post(&self.url).json(body).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(url = %self.url, status = status.as_u16(), "Webhook rejected delivery");
            return Err(WebhookError::HttpStatus(status.as_u16()));
        }
        tracing::info!(url = %self.url, "Webhook delivery succeeded");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use intake_core::platform::PlatformApi;
use intake_core::record::Record;
use intake_events::{DeliveryTarget, WebhookError};
use intake_platform::InMemoryPlatform;
use intake_worker::submit::{SubmitConfig, SubmitJobController};

pub const WEBHOOK_URL: &str = "https://webhook.test/1234";

/// Delivery target that records bodies and answers with a fixed status.
pub struct RecordingTarget {
    status: u16,
    pub bodies: Mutex<Vec<Value>>,
}

impl RecordingTarget {
    pub fn answering(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            bodies: Mutex::new(Vec::new()),
        })
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryTarget for RecordingTarget {
    fn destination(&self) -> &str {
        "webhook.test"
    }

    fn url(&self) -> &str {
        WEBHOOK_URL
    }

    async fn deliver(&self, body: &Value) -> Result<(), WebhookError> {
        self.bodies.lock().unwrap().push(body.clone());
        if self.status == 200 {
            Ok(())
        } else {
            Err(WebhookError::HttpStatus(self.status))
        }
    }
}

pub fn contact(id: &str, first: &str, email: &str) -> Record {
    Record::new(id)
        .with_value("firstName", first)
        .with_value("lastName", "Doe")
        .with_value("email", email)
        .with_value("phone", "+15551234567")
}

/// Platform with workbook `wb_1` holding two sheets of contacts.
pub fn seeded_platform() -> Arc<InMemoryPlatform> {
    let platform = Arc::new(InMemoryPlatform::new());
    let contacts = platform.add_sheet("wb_1", "Contacts", Some("contacts"));
    let leads = platform.add_sheet("wb_1", "Leads", None);
    platform.insert_records(
        &contacts.id,
        [
            contact("rc_1", "Ada", "ada@example.com"),
            contact("rc_2", "Grace", "grace@example.com"),
        ],
    );
    platform.insert_records(&leads.id, [contact("rc_3", "Alan", "alan@example.com")]);
    platform
}

pub fn controller(
    platform: &Arc<InMemoryPlatform>,
    target: &Arc<RecordingTarget>,
) -> SubmitJobController {
    let platform: Arc<dyn PlatformApi> = platform.clone();
    let target: Arc<dyn DeliveryTarget> = target.clone();
    SubmitJobController::new(platform, target, SubmitConfig::default())
}

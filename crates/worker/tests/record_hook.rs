//! Contacts record hook against the in-memory platform.

mod common;

use std::sync::Arc;

use intake_core::platform::{PlatformApi, RecordsApi};
use intake_core::record::{FieldValue, Record};
use intake_events::{EventHandler, PlatformEvent};
use intake_platform::{InMemoryPlatform, RecordUpdate};
use intake_worker::ingest::{HookSummary, RecordHook};

fn hook(platform: &Arc<InMemoryPlatform>) -> RecordHook {
    let platform: Arc<dyn PlatformApi> = platform.clone();
    RecordHook::contacts(platform).unwrap()
}

#[tokio::test]
async fn commit_rewrites_contact_records() {
    let platform = Arc::new(InMemoryPlatform::new());
    let sheet = platform.add_sheet("wb_1", "Contacts", Some("contacts"));
    platform.insert_records(
        &sheet.id,
        [
            Record::new("rc_1")
                .with_value("firstName", "ada")
                .with_value("lastName", "lovelace")
                .with_value("email", "ada@example.com")
                .with_value("phone", "+15551234567"),
            Record::new("rc_2")
                .with_value("firstName", "")
                .with_value("email", "not-an-email")
                .with_value("phone", "12"),
        ],
    );

    hook(&platform)
        .handle(&PlatformEvent::commit_created(&sheet.id, "contacts"))
        .await;

    let records = platform.records(&sheet.id);
    let ada = &records[0];
    assert_eq!(ada.get("firstName"), Some(&FieldValue::from("Ada")));
    assert_eq!(ada.get("lastName"), Some(&FieldValue::from("Lovelace")));
    assert!(ada.is_valid());

    let bad = &records[1];
    assert_eq!(bad.errors_for("firstName"), ["Invalid First Name"]);
    assert_eq!(bad.errors_for("lastName"), ["Invalid Last Name"]);
    assert_eq!(bad.errors_for("email"), ["Invalid email address"]);
    assert!(bad.errors_for("phone").is_empty(), "12 is a valid E.164-ish number");
}

#[tokio::test]
async fn process_sheet_reports_counts() {
    let platform = Arc::new(InMemoryPlatform::new());
    let sheet = platform.add_sheet("wb_1", "Contacts", Some("contacts"));
    platform.insert_records(
        &sheet.id,
        [
            common::contact("rc_1", "Ada", "ada@example.com"),
            common::contact("rc_2", "Grace", "grace@"),
        ],
    );

    let summary = hook(&platform).process_sheet(&sheet.id).await.unwrap();

    assert_eq!(
        summary,
        HookSummary {
            records: 2,
            invalid: 1,
            updated: 1,
        }
    );
}

#[tokio::test]
async fn other_sheet_slugs_are_left_alone() {
    let platform = Arc::new(InMemoryPlatform::new());
    let sheet = platform.add_sheet("wb_1", "Leads", Some("leads"));
    platform.insert_records(&sheet.id, [Record::new("rc_1").with_value("firstName", "ada")]);

    hook(&platform)
        .handle(&PlatformEvent::commit_created(&sheet.id, "leads"))
        .await;

    let records = platform.records(&sheet.id);
    assert_eq!(records[0].get("firstName"), Some(&FieldValue::from("ada")));
}

#[tokio::test]
async fn unknown_sheet_is_an_error() {
    let platform = Arc::new(InMemoryPlatform::new());

    let result = hook(&platform)
        .process_sheet(&"us_sh_missing".to_string())
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn repeated_runs_do_not_duplicate_errors() {
    let platform = Arc::new(InMemoryPlatform::new());
    let sheet = platform.add_sheet("wb_1", "Contacts", Some("contacts"));
    platform.insert_records(&sheet.id, [common::contact("rc_1", "Ada", "bad")]);
    let hook = hook(&platform);

    hook.process_sheet(&sheet.id).await.unwrap();
    hook.process_sheet(&sheet.id).await.unwrap();

    let record = &platform.records(&sheet.id)[0];
    assert_eq!(record.errors_for("email"), ["Invalid email address"]);
    assert_eq!(record.error_count(), 1);
}

#[tokio::test]
async fn corrected_value_clears_its_error() {
    let platform = Arc::new(InMemoryPlatform::new());
    let sheet = platform.add_sheet("wb_1", "Contacts", Some("contacts"));
    platform.insert_records(&sheet.id, [common::contact("rc_1", "Ada", "bad")]);
    let hook = hook(&platform);

    hook.process_sheet(&sheet.id).await.unwrap();
    assert!(!platform.records(&sheet.id)[0].is_valid());

    let mut corrected = platform.records(&sheet.id)[0].clone();
    corrected.set("email", "ada@example.com");
    platform.update(&sheet.id, &[corrected]).await.unwrap();

    let summary = hook.process_sheet(&sheet.id).await.unwrap();

    assert_eq!(summary.invalid, 0);
    let record = &platform.records(&sheet.id)[0];
    assert!(record.is_valid(), "errors left behind: {:?}", record.errors);
}

#[tokio::test]
async fn unchanged_records_are_not_written_back() {
    let platform = Arc::new(InMemoryPlatform::new());
    let sheet = platform.add_sheet("wb_1", "Contacts", Some("contacts"));
    platform.insert_records(
        &sheet.id,
        [
            common::contact("rc_1", "ada", "ada@example.com"),
            common::contact("rc_2", "Grace", "grace@example.com"),
        ],
    );
    let hook = hook(&platform);

    let first = hook.process_sheet(&sheet.id).await.unwrap();
    assert_eq!(first.updated, 1);
    assert_eq!(
        platform.updates(),
        vec![RecordUpdate {
            sheet_id: sheet.id.clone(),
            record_ids: vec!["rc_1".to_string()],
        }]
    );

    let second = hook.process_sheet(&sheet.id).await.unwrap();
    assert_eq!(second.updated, 0);
    assert_eq!(platform.updates().len(), 1, "second run made an update call");
}

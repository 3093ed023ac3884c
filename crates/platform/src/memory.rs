//! In-memory platform.
//!
//! Holds sheets and records in process and records every job call and
//! record update, so controller and hook runs can be asserted on without a
//! live platform. Faults can be injected per operation.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use intake_core::job::{JobAck, JobOutcome};
use intake_core::platform::{JobsApi, PlatformError, RecordsApi, Sheet, SheetsApi};
use intake_core::record::Record;
use intake_core::types::{JobId, RecordId, SheetId, WorkbookId};

/// Status used for injected faults.
const FAULT_STATUS: u16 = 503;

/// A job API call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCall {
    Ack { job_id: JobId, ack: JobAck },
    Complete { job_id: JobId, outcome: JobOutcome },
    Fail { job_id: JobId, outcome: JobOutcome },
}

/// One `records.update` call: the sheet and the ids it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub sheet_id: SheetId,
    pub record_ids: Vec<RecordId>,
}

#[derive(Default)]
struct Faults {
    ack: bool,
    list: bool,
    records: HashSet<SheetId>,
    terminal: bool,
}

#[derive(Default)]
struct State {
    sheets: Vec<Sheet>,
    records: HashMap<SheetId, Vec<Record>>,
    job_calls: Vec<JobCall>,
    updates: Vec<RecordUpdate>,
    faults: Faults,
}

#[derive(Default)]
pub struct InMemoryPlatform {
    state: Mutex<State>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an empty sheet to `workbook_id` and return it.
    pub fn add_sheet(&self, workbook_id: &str, name: &str, slug: Option<&str>) -> Sheet {
        let sheet = Sheet {
            id: format!("us_sh_{}", uuid::Uuid::new_v4().simple()),
            workbook_id: workbook_id.to_string(),
            name: name.to_string(),
            slug: slug.map(str::to_string),
        };
        let mut state = self.state();
        state.records.insert(sheet.id.clone(), Vec::new());
        state.sheets.push(sheet.clone());
        sheet
    }

    pub fn insert_records(&self, sheet_id: &str, records: impl IntoIterator<Item = Record>) {
        self.state()
            .records
            .entry(sheet_id.to_string())
            .or_default()
            .extend(records);
    }

    /// Current records of a sheet (empty for unknown sheets).
    pub fn records(&self, sheet_id: &str) -> Vec<Record> {
        self.state()
            .records
            .get(sheet_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn job_calls(&self) -> Vec<JobCall> {
        self.state().job_calls.clone()
    }

    /// Every `records.update` call, including rejected ones.
    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.state().updates.clone()
    }

    pub fn fail_ack(&self) {
        self.state().faults.ack = true;
    }

    pub fn fail_sheet_listing(&self) {
        self.state().faults.list = true;
    }

    pub fn fail_records(&self, sheet_id: &str) {
        self.state().faults.records.insert(sheet_id.to_string());
    }

    /// Make `complete` and `fail` error after recording the call.
    pub fn fail_terminal_calls(&self) {
        self.state().faults.terminal = true;
    }
}

fn injected(operation: &str) -> PlatformError {
    PlatformError::Api {
        status: FAULT_STATUS,
        body: format!("injected fault: {operation}"),
    }
}

#[async_trait]
impl JobsApi for InMemoryPlatform {
    async fn ack(&self, job_id: &JobId, ack: JobAck) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.job_calls.push(JobCall::Ack {
            job_id: job_id.clone(),
            ack,
        });
        if state.faults.ack {
            return Err(injected("ack"));
        }
        Ok(())
    }

    async fn complete(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.job_calls.push(JobCall::Complete {
            job_id: job_id.clone(),
            outcome,
        });
        if state.faults.terminal {
            return Err(injected("complete"));
        }
        Ok(())
    }

    async fn fail(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.job_calls.push(JobCall::Fail {
            job_id: job_id.clone(),
            outcome,
        });
        if state.faults.terminal {
            return Err(injected("fail"));
        }
        Ok(())
    }
}

#[async_trait]
impl SheetsApi for InMemoryPlatform {
    async fn list(&self, workbook_id: &WorkbookId) -> Result<Vec<Sheet>, PlatformError> {
        let state = self.state();
        if state.faults.list {
            return Err(injected("sheets.list"));
        }
        Ok(state
            .sheets
            .iter()
            .filter(|s| &s.workbook_id == workbook_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecordsApi for InMemoryPlatform {
    async fn get(&self, sheet_id: &SheetId) -> Result<Vec<Record>, PlatformError> {
        let state = self.state();
        if state.faults.records.contains(sheet_id) {
            return Err(injected("records.get"));
        }
        state
            .records
            .get(sheet_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
                entity: "sheet",
                id: sheet_id.clone(),
            })
    }

    /// All-or-nothing: every id is checked before any record is replaced.
    async fn update(&self, sheet_id: &SheetId, records: &[Record]) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.updates.push(RecordUpdate {
            sheet_id: sheet_id.clone(),
            record_ids: records.iter().map(|r| r.id.clone()).collect(),
        });

        let stored = state
            .records
            .get_mut(sheet_id)
            .ok_or_else(|| PlatformError::NotFound {
                entity: "sheet",
                id: sheet_id.clone(),
            })?;

        let positions = records
            .iter()
            .map(|updated| {
                stored
                    .iter()
                    .position(|r| r.id == updated.id)
                    .ok_or_else(|| PlatformError::NotFound {
                        entity: "record",
                        id: updated.id.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (position, updated) in positions.into_iter().zip(records) {
            stored[position] = updated.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn list_returns_only_the_workbooks_sheets_in_order() {
        let platform = InMemoryPlatform::new();
        let a = platform.add_sheet("wb_1", "Contacts", Some("contacts"));
        platform.add_sheet("wb_2", "Other", None);
        let b = platform.add_sheet("wb_1", "Leads", None);

        let sheets = platform.list(&"wb_1".to_string()).await.unwrap();
        assert_eq!(sheets, vec![a, b]);
    }

    #[tokio::test]
    async fn get_unknown_sheet_is_not_found() {
        let platform = InMemoryPlatform::new();
        let result = platform.get(&"missing".to_string()).await;
        assert_matches!(result, Err(PlatformError::NotFound { entity: "sheet", .. }));
    }

    #[tokio::test]
    async fn update_replaces_matching_records() {
        let platform = InMemoryPlatform::new();
        let sheet = platform.add_sheet("wb_1", "Contacts", Some("contacts"));
        platform.insert_records(&sheet.id, [Record::new("rc_1").with_value("firstName", "ada")]);

        let updated = Record::new("rc_1").with_value("firstName", "Ada");
        platform.update(&sheet.id, &[updated.clone()]).await.unwrap();
        assert_eq!(platform.records(&sheet.id), vec![updated]);
    }

    #[tokio::test]
    async fn update_unknown_record_is_not_found() {
        let platform = InMemoryPlatform::new();
        let sheet = platform.add_sheet("wb_1", "Contacts", None);
        let result = platform.update(&sheet.id, &[Record::new("rc_9")]).await;
        assert_matches!(result, Err(PlatformError::NotFound { entity: "record", .. }));
    }

    #[tokio::test]
    async fn failed_update_leaves_sheet_untouched() {
        let platform = InMemoryPlatform::new();
        let sheet = platform.add_sheet("wb_1", "Contacts", None);
        let original = Record::new("rc_1").with_value("firstName", "ada");
        platform.insert_records(&sheet.id, [original.clone()]);

        let result = platform
            .update(
                &sheet.id,
                &[
                    Record::new("rc_1").with_value("firstName", "Ada"),
                    Record::new("rc_9"),
                ],
            )
            .await;

        assert_matches!(result, Err(PlatformError::NotFound { entity: "record", .. }));
        assert_eq!(platform.records(&sheet.id), vec![original]);
        assert_eq!(
            platform.updates(),
            vec![RecordUpdate {
                sheet_id: sheet.id.clone(),
                record_ids: vec!["rc_1".to_string(), "rc_9".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn injected_ack_fault_is_still_recorded() {
        let platform = InMemoryPlatform::new();
        platform.fail_ack();
        let ack = JobAck {
            info: "start".to_string(),
            progress: 10,
        };
        let result = platform.ack(&"job_1".to_string(), ack.clone()).await;
        assert_matches!(result, Err(PlatformError::Api { status: 503, .. }));
        assert_eq!(
            platform.job_calls(),
            vec![JobCall::Ack {
                job_id: "job_1".to_string(),
                ack
            }]
        );
    }
}

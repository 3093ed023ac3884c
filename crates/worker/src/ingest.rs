//! Ingestion-time record hook.
//!
//! When records are committed to a sheet whose slug matches the hook, the
//! hook fetches the sheet's records, runs the record processor over each
//! one and writes back the records whose values or errors changed.
//!
//! Errors on schema fields are rebuilt from the current values on every
//! run, so a corrected value clears its error. The write-back is itself a
//! commit, so unchanged records are never written.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use intake_core::error::CoreError;
use intake_core::platform::{PlatformApi, PlatformError};
use intake_core::record::Record;
use intake_core::schema::{contacts_sheet, SheetSchema};
use intake_core::types::SheetId;
use intake_core::validation::{contact_rules, process, FieldRule};
use intake_events::{EventHandler, PlatformEvent};

/// Counts from one hook run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookSummary {
    pub records: usize,
    pub invalid: usize,
    /// Records written back because processing changed them.
    pub updated: usize,
}

/// Binds an ordered rule list to one sheet slug.
pub struct RecordHook {
    schema: SheetSchema,
    rules: Vec<FieldRule>,
    /// Fields that have at least one check; others get type-mismatch errors.
    checked: HashSet<String>,
    platform: Arc<dyn PlatformApi>,
}

impl RecordHook {
    /// Fails if any rule names a field the schema does not declare.
    pub fn new(
        schema: SheetSchema,
        rules: Vec<FieldRule>,
        platform: Arc<dyn PlatformApi>,
    ) -> Result<Self, CoreError> {
        schema.ensure_fields(rules.iter().map(FieldRule::field))?;
        let checked = rules
            .iter()
            .filter(|r| r.is_check())
            .map(|r| r.field().to_string())
            .collect();
        Ok(Self {
            schema,
            rules,
            checked,
            platform,
        })
    }

    /// The hook for the `contacts` sheet.
    pub fn contacts(platform: Arc<dyn PlatformApi>) -> Result<Self, CoreError> {
        let schema = contacts_sheet();
        let rules = contact_rules(&schema);
        Self::new(schema, rules, platform)
    }

    pub fn sheet_slug(&self) -> &str {
        &self.schema.slug
    }

    /// Apply the rules and schema type checks to one record.
    ///
    /// Errors previously stored under schema fields are dropped first;
    /// errors on other fields are left alone.
    pub fn apply(&self, mut record: Record) -> Record {
        for field in &self.schema.fields {
            record.clear_errors(&field.key);
        }
        let mut record = process(record, &self.rules);
        for mismatch in self.schema.type_mismatches(&record) {
            if self.checked.contains(&mismatch.field) {
                continue;
            }
            record.add_error(
                mismatch.field,
                format!(
                    "Expected {}, found {}",
                    mismatch.expected.as_str(),
                    mismatch.found
                ),
            );
        }
        record
    }

    /// Process every record of `sheet_id` and write back the changed ones.
    pub async fn process_sheet(&self, sheet_id: &SheetId) -> Result<HookSummary, PlatformError> {
        let fetched = self.platform.get(sheet_id).await?;
        let mut summary = HookSummary {
            records: fetched.len(),
            invalid: 0,
            updated: 0,
        };

        let mut changed = Vec::new();
        for original in fetched {
            let processed = self.apply(original.clone());
            if !processed.is_valid() {
                summary.invalid += 1;
            }
            if processed != original {
                changed.push(processed);
            }
        }

        summary.updated = changed.len();
        if !changed.is_empty() {
            self.platform.update(sheet_id, &changed).await?;
        }
        Ok(summary)
    }
}

#[async_trait]
impl EventHandler for RecordHook {
    fn name(&self) -> &str {
        "record-hook"
    }

    async fn handle(&self, event: &PlatformEvent) {
        if event.context.sheet_slug.as_deref() != Some(self.sheet_slug()) {
            return;
        }
        let Some(sheet_id) = event.context.sheet_id.as_ref() else {
            tracing::warn!(slug = self.sheet_slug(), "Commit event has no sheet id, ignoring");
            return;
        };

        match self.process_sheet(sheet_id).await {
            Ok(summary) => {
                tracing::info!(
                    sheet_id = %sheet_id,
                    records = summary.records,
                    invalid = summary.invalid,
                    updated = summary.updated,
                    "Record hook applied",
                );
            }
            Err(e) => {
                tracing::error!(sheet_id = %sheet_id, error = %e, "Record hook failed");
            }
        }
    }
}

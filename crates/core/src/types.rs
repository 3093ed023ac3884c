//! Identifier and timestamp aliases shared across the workspace.
//!
//! Every id is assigned by the hosted platform and treated as opaque.

/// Platform-assigned record id (e.g. `us_rc_7f3a..`).
pub type RecordId = String;

/// Platform-assigned sheet id.
pub type SheetId = String;

/// Platform-assigned workbook id.
pub type WorkbookId = String;

/// Platform-assigned job id.
pub type JobId = String;

/// Platform-assigned space id.
pub type SpaceId = String;

/// Platform-assigned environment id.
pub type EnvironmentId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

//! Job types, submit-job lifecycle states and job API payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Progress reported when a submit job is acknowledged.
pub const ACK_PROGRESS: u8 = 10;

/// Job type carried in a `job:ready` event context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobType {
    /// `space:configure`
    SpaceConfigure,
    /// `workbook:submitAction`
    WorkbookSubmitAction,
    Other(String),
}

impl JobType {
    pub fn parse(s: &str) -> Self {
        match s {
            "space:configure" => JobType::SpaceConfigure,
            "workbook:submitAction" => JobType::WorkbookSubmitAction,
            other => JobType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobType::SpaceConfigure => "space:configure",
            JobType::WorkbookSubmitAction => "workbook:submitAction",
            JobType::Other(s) => s,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(JobType::parse(&s))
    }
}

/// Lifecycle of one submit job run.
///
/// `Completed` and `Failed` are terminal; a run always ends in one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitJobState {
    Ready,
    Acknowledged,
    Delivering,
    Completed,
    Failed,
}

impl SubmitJobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmitJobState::Completed | SubmitJobState::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: SubmitJobState) -> bool {
        use SubmitJobState::*;
        matches!(
            (self, next),
            (Ready, Acknowledged)
                | (Ready, Failed)
                | (Acknowledged, Delivering)
                | (Acknowledged, Failed)
                | (Delivering, Completed)
                | (Delivering, Failed)
        )
    }
}

/// Body of `jobs.ack`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAck {
    pub info: String,
    pub progress: u8,
}

/// Outcome attached to `jobs.complete` / `jobs.fail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub message: String,
}

impl JobOutcome {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

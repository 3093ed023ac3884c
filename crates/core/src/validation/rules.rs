//! Field rule types and the contacts rule set.

use serde::{Deserialize, Serialize};

use super::{checks, transforms};
use crate::record::FieldValue;
use crate::schema::SheetSchema;

/// A value rewrite applied before checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Capitalize,
    Lowercase,
}

impl Transform {
    /// Rewrite text values. Absent and non-text values pass through.
    pub fn apply(self, value: &FieldValue) -> Option<FieldValue> {
        let text = value.as_text()?;
        let out = match self {
            Transform::Capitalize => transforms::capitalize(text),
            Transform::Lowercase => transforms::lowercase(text),
        };
        Some(FieldValue::Text(out))
    }
}

/// A predicate over one field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    NonEmptyString,
    Email,
    Phone,
}

impl Check {
    pub fn passes(self, value: Option<&FieldValue>) -> bool {
        match self {
            Check::NonEmptyString => checks::is_non_empty_string(value),
            Check::Email => checks::is_valid_email(value),
            Check::Phone => checks::is_valid_phone(value),
        }
    }
}

/// One rule bound to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRule {
    Transform {
        field: String,
        transform: Transform,
    },
    Validate {
        field: String,
        check: Check,
        message: String,
    },
}

impl FieldRule {
    pub fn capitalize(field: &str) -> Self {
        FieldRule::Transform {
            field: field.to_string(),
            transform: Transform::Capitalize,
        }
    }

    pub fn lowercase(field: &str) -> Self {
        FieldRule::Transform {
            field: field.to_string(),
            transform: Transform::Lowercase,
        }
    }

    /// Non-empty text check reported as `Invalid {label}`.
    pub fn non_empty(field: &str, label: &str) -> Self {
        FieldRule::Validate {
            field: field.to_string(),
            check: Check::NonEmptyString,
            message: format!("Invalid {label}"),
        }
    }

    pub fn email(field: &str) -> Self {
        FieldRule::Validate {
            field: field.to_string(),
            check: Check::Email,
            message: "Invalid email address".to_string(),
        }
    }

    pub fn phone(field: &str) -> Self {
        FieldRule::Validate {
            field: field.to_string(),
            check: Check::Phone,
            message: "Invalid phone number".to_string(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            FieldRule::Transform { field, .. } | FieldRule::Validate { field, .. } => field,
        }
    }

    pub fn is_check(&self) -> bool {
        matches!(self, FieldRule::Validate { .. })
    }
}

/// Rules for the `contacts` sheet: capitalize names, then check every field.
pub fn contact_rules(sheet: &SheetSchema) -> Vec<FieldRule> {
    vec![
        FieldRule::capitalize("firstName"),
        FieldRule::capitalize("lastName"),
        FieldRule::non_empty("firstName", sheet.label("firstName")),
        FieldRule::non_empty("lastName", sheet.label("lastName")),
        FieldRule::email("email"),
        FieldRule::phone("phone"),
    ]
}

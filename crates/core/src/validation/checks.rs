//! Field checks: pure predicates over an optional field value.
//!
//! A check never errors. Absent values and values of the wrong kind simply
//! fail the check.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::FieldValue;

/// Loose `local@domain.tld` shape; not an RFC 5322 validator.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// E.164-like: optional `+`, no leading zero, 2 to 15 digits.
const PHONE_PATTERN: &str = r"^\+?[1-9][0-9]{1,14}$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("valid regex"));

/// Passes for present, non-empty text.
pub fn is_non_empty_string(value: Option<&FieldValue>) -> bool {
    matches!(value.and_then(FieldValue::as_text), Some(s) if !s.is_empty())
}

pub fn is_valid_email(value: Option<&FieldValue>) -> bool {
    value
        .and_then(FieldValue::as_text)
        .is_some_and(|s| EMAIL_RE.is_match(s))
}

pub fn is_valid_phone(value: Option<&FieldValue>) -> bool {
    value
        .and_then(FieldValue::as_text)
        .is_some_and(|s| PHONE_RE.is_match(s))
}

//! Records: one row of sheet data plus its accumulated field errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// A single cell value as it arrives from the platform.
///
/// `Unsupported` keeps values of a JSON kind no sheet field can hold
/// (arrays, objects) so they surface as validation errors instead of
/// failing deserialization of the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Unsupported(serde_json::Value),
}

impl FieldValue {
    /// The string content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Lower-case name of the JSON kind, used in type-mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "string",
            FieldValue::Unsupported(v) if v.is_array() => "array",
            FieldValue::Unsupported(_) => "object",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// One row of tabular data.
///
/// Field order and error insertion order are both preserved. Validity is
/// derived from the error map; there is no stored flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub values: IndexMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub errors: IndexMap<String, Vec<String>>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter used when assembling records in code.
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Value of `field`, treating JSON `null` the same as a missing key.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        match self.values.get(field) {
            Some(FieldValue::Null) | None => None,
            Some(v) => Some(v),
        }
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(field.into(), value.into());
    }

    /// Append an error message under `field`.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Drop every error recorded under `field`.
    pub fn clear_errors(&mut self, field: &str) {
        self.errors.shift_remove(field);
    }

    pub fn errors_for(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of error messages across all fields.
    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_record_is_valid() {
        let record = Record::new("rc_1").with_value("email", "a@b.co");
        assert!(record.is_valid());
        assert_eq!(record.error_count(), 0);
    }

    #[test]
    fn add_error_makes_record_invalid() {
        let mut record = Record::new("rc_1");
        record.add_error("email", "Invalid email address");
        assert!(!record.is_valid());
        assert_eq!(record.errors_for("email"), ["Invalid email address"]);
        assert!(record.errors_for("phone").is_empty());
    }

    #[test]
    fn errors_keep_insertion_order() {
        let mut record = Record::new("rc_1");
        record.add_error("phone", "first");
        record.add_error("email", "second");
        record.add_error("phone", "third");
        let keys: Vec<_> = record.errors.keys().cloned().collect();
        assert_eq!(keys, ["phone", "email"]);
        assert_eq!(record.error_count(), 3);
    }

    #[test]
    fn null_is_treated_as_absent() {
        let record: Record = serde_json::from_value(json!({
            "id": "rc_1",
            "values": {"firstName": null, "email": "a@b.co"}
        }))
        .unwrap();
        assert!(record.get("firstName").is_none());
        assert!(record.get("missing").is_none());
        assert_eq!(record.get("email").and_then(FieldValue::as_text), Some("a@b.co"));
    }

    #[test]
    fn unsupported_kinds_are_kept() {
        let record: Record = serde_json::from_value(json!({
            "id": "rc_1",
            "values": {"phone": [1, 2], "email": {"x": 1}, "lastName": 7}
        }))
        .unwrap();
        assert_eq!(record.get("phone").map(FieldValue::kind), Some("array"));
        assert_eq!(record.get("email").map(FieldValue::kind), Some("object"));
        assert_eq!(record.get("lastName").map(FieldValue::kind), Some("number"));
    }

    #[test]
    fn missing_id_is_rejected() {
        let result = serde_json::from_value::<Record>(json!({"values": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn clear_errors_only_touches_one_field() {
        let mut record = Record::new("rc_1");
        record.add_error("email", "Invalid email address");
        record.add_error("phone", "Invalid phone number");

        record.clear_errors("email");
        record.clear_errors("lastName");

        assert!(record.errors_for("email").is_empty());
        assert_eq!(record.errors_for("phone"), ["Invalid phone number"]);
        let keys: Vec<_> = record.errors.keys().cloned().collect();
        assert_eq!(keys, ["phone"]);
    }

    #[test]
    fn empty_errors_are_not_serialized() {
        let record = Record::new("rc_1").with_value("firstName", "Ada");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["values"]["firstName"], "Ada");
    }
}

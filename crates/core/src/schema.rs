//! Sheet schemas and the contacts blueprint.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::record::{FieldValue, Record};

/// Declared type of a sheet field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

impl FieldType {
    /// Whether `value` is of this type. Absent values always match;
    /// presence is a separate rule.
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Null) => true,
            (FieldType::String, FieldValue::Text(_)) => true,
            (FieldType::Number, FieldValue::Number(_)) => true,
            (FieldType::Boolean, FieldValue::Boolean(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
}

impl FieldSchema {
    pub fn string(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            field_type: FieldType::String,
            label: label.to_string(),
        }
    }
}

/// A value whose kind does not match the field's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub field: String,
    pub expected: FieldType,
    pub found: &'static str,
}

/// Ordered field list shared by every record of one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSchema {
    pub name: String,
    pub slug: String,
    pub fields: Vec<FieldSchema>,
}

impl SheetSchema {
    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Display label for `key`, falling back to the key itself.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.field(key).map(|f| f.label.as_str()).unwrap_or(key)
    }

    /// Ensure every key in `keys` is declared on this sheet.
    pub fn ensure_fields<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), CoreError> {
        for key in keys {
            if self.field(key).is_none() {
                return Err(CoreError::UnknownField {
                    sheet: self.slug.clone(),
                    field: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Report every declared field whose value has the wrong kind.
    ///
    /// Fields the schema does not declare are ignored.
    pub fn type_mismatches(&self, record: &Record) -> Vec<TypeMismatch> {
        self.fields
            .iter()
            .filter_map(|f| {
                let value = record.values.get(&f.key)?;
                (!f.field_type.accepts(value)).then(|| TypeMismatch {
                    field: f.key.clone(),
                    expected: f.field_type,
                    found: value.kind(),
                })
            })
            .collect()
    }
}

/// The `contacts` sheet: first name, last name, email and phone.
pub fn contacts_sheet() -> SheetSchema {
    SheetSchema {
        name: "Contacts".to_string(),
        slug: "contacts".to_string(),
        fields: vec![
            FieldSchema::string("firstName", "First Name"),
            FieldSchema::string("lastName", "Last Name"),
            FieldSchema::string("email", "Email"),
            FieldSchema::string("phone", "Phone"),
        ],
    }
}

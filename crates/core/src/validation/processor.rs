//! Record processor: applies an ordered rule list to one record.

use super::rules::FieldRule;
use crate::record::Record;

/// Apply `rules` to `record` in declared order.
///
/// Transforms rewrite the value in place, so later checks see the rewritten
/// value. Every failing check appends its message under its field; nothing
/// short-circuits. Absent or wrongly typed values are check failures, never
/// panics.
pub fn process(mut record: Record, rules: &[FieldRule]) -> Record {
    for rule in rules {
        match rule {
            FieldRule::Transform { field, transform } => {
                let rewritten = record.get(field).and_then(|v| transform.apply(v));
                if let Some(value) = rewritten {
                    record.set(field.clone(), value);
                }
            }
            FieldRule::Validate {
                field,
                check,
                message,
            } => {
                if !check.passes(record.get(field)) {
                    record.add_error(field.clone(), message.clone());
                }
            }
        }
    }
    record
}

//! Field rule engine and record processor.
//!
//! Pure functions only: [`transforms`] rewrite values, [`checks`] return a
//! verdict, [`rules`] binds either to a field, and [`processor`] applies an
//! ordered rule list to one record.

pub mod checks;
pub mod processor;
pub mod rules;
pub mod transforms;

pub use processor::process;
pub use rules::{contact_rules, Check, FieldRule, Transform};

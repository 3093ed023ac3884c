//! Domain types and pure logic for contact intake.
//!
//! - [`record`] / [`schema`]: strongly typed records and sheet blueprints.
//! - [`validation`]: the field rule engine and the record processor.
//! - [`job`]: submit-job states and job API payloads.
//! - [`platform`]: collaborator traits for the hosted platform API.

pub mod error;
pub mod job;
pub mod platform;
pub mod record;
pub mod schema;
pub mod types;
pub mod validation;

pub use error::CoreError;
pub use record::{FieldValue, Record};
pub use schema::{FieldSchema, FieldType, SheetSchema};

//! `intake-worker` library crate.
//!
//! Re-exports the worker's modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod event_log;
pub mod ingest;
pub mod listeners;
pub mod server;
pub mod submit;

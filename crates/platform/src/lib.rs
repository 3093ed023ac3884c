//! Implementations of the platform collaborator traits.
//!
//! - [`PlatformClient`]: REST client for the hosted platform.
//! - [`InMemoryPlatform`]: process-local platform with fault injection.

pub mod client;
pub mod memory;

pub use client::PlatformClient;
pub use memory::{InMemoryPlatform, JobCall, RecordUpdate};

//! Platform events, dispatch and outbound delivery.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] -- typed event envelope (topic, context, payload).
//! - [`Listener`] -- filtered handler registration and the dispatch loop.
//! - [`delivery`] -- one-shot webhook delivery.

pub mod bus;
pub mod delivery;
pub mod listener;

pub use bus::{EventBus, EventContext, EventTopic, PlatformEvent};
pub use delivery::webhook::{DeliveryTarget, WebhookDelivery, WebhookError};
pub use listener::{EventFilter, EventHandler, Listener, ANY_TOPIC};

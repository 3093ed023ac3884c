//! Outbound delivery channels.
//!
//! Submitted workbook data leaves the worker through a
//! [`DeliveryTarget`](webhook::DeliveryTarget); the only implementation is
//! the one-shot webhook.

pub mod webhook;

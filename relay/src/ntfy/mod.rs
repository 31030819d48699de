//! Delivery to the ntfy push endpoint.

pub mod client;

pub use client::{DispatchError, NtfyClient, ICON_URL, TEST_MODE_SUFFIX};

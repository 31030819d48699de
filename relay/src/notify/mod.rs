//! Notification building.
//!
//! ```text
//! (event type, data.object) → build_notification() → Notification
//! ```

pub mod builder;
pub mod money;
pub mod objects;

pub use builder::{build_notification, handler_for, EventHandler, Notification, HANDLERS};
pub use money::{format_amount, Money};

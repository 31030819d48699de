//! stripe-ntfy - Stripe webhook to ntfy push notification relay.
//!
//! ## Architecture
//!
//! ```text
//! Stripe → POST / → verify signature → build notification → ntfy
//! ```
//!
//! Every request runs the pipeline to completion before it is answered. There
//! is no queue and no retry; Stripe redelivers events that get a 5xx.

pub mod config;
pub mod notify;
pub mod ntfy;
pub mod stripe;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError, NtfyAuth, NtfyConfig};
pub use notify::{build_notification, format_amount, Notification};
pub use ntfy::{DispatchError, NtfyClient};
pub use stripe::{EventVerifier, InboundEvent, StripeVerifier, VerificationError};
pub use web::{router, AppState};

//! Stripe webhook authentication.
//!
//! ```text
//! raw body + Stripe-Signature → EventVerifier::verify() → InboundEvent
//! ```

pub mod event;
pub mod signature;

pub use event::InboundEvent;
pub use signature::{
    compute_signature, EventVerifier, StripeVerifier, VerificationError, SIGNATURE_HEADER,
};

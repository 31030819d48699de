//! Web server module for receiving Stripe webhooks.
//!
//! A single route, `POST /`, verifies the webhook and forwards a notification
//! to ntfy before answering. Stripe only inspects the status code.

pub mod error;
pub mod handlers;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

pub use error::ReceiveError;
pub use handlers::{stripe_webhook, AppState, MAX_BODY_BYTES};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(stripe_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

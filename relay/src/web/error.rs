//! Webhook handler errors and their HTTP status codes.
//!
//! Stripe only looks at the status code, so responses carry no body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::ntfy::DispatchError;
use crate::stripe::VerificationError;

#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("request body exceeds {limit} bytes or could not be read")]
    BodyTooLarge { limit: usize },

    #[error("Stripe-Signature header missing")]
    MissingSignature,

    #[error("webhook verification failed: {0}")]
    VerificationFailed(#[from] VerificationError),

    #[error("forwarding to ntfy failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl ReceiveError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReceiveError::BodyTooLarge { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ReceiveError::MissingSignature | ReceiveError::VerificationFailed(_) => {
                StatusCode::UNAUTHORIZED
            }
            ReceiveError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReceiveError {
    fn into_response(self) -> Response {
        self.status_code().into_response()
    }
}

//! Error types for the gateway layer.
//!
//! Protocol errors and domain errors both come back to the client as a
//! `connection_error` frame carrying a stable code; only transport errors
//! tear the connection down.

use frontdesk_conversations::ConversationError;
use frontdesk_store::StoreError;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Conversation(#[from] ConversationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Admission refused: {reason}")]
    AdmissionRefused { reason: String },

    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    #[error("Unknown event: {event}")]
    UnknownEvent { event: String },
}

impl GatewayError {
    pub fn admission_refused(reason: impl Into<String>) -> Self {
        Self::AdmissionRefused {
            reason: reason.into(),
        }
    }

    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
        }
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Stable code carried in `connection_error` frames.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Conversation(inner) => inner.code(),
            GatewayError::Store(_) => "store_error",
            GatewayError::AdmissionRefused { .. } => "admission_refused",
            GatewayError::AccessDenied { .. } => "access_denied",
            GatewayError::InvalidPayload { .. } => "invalid_payload",
            GatewayError::UnknownEvent { .. } => "unknown_event",
        }
    }
}

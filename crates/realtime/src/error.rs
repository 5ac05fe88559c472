//! Error types for the realtime crate.

use thiserror::Error;

pub type RealtimeResult<T> = Result<T, RealtimeError>;

#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The connection did not provide what its role requires; no client was
    /// registered and the socket should be closed.
    #[error("admission refused: {reason}")]
    AdmissionRefused { reason: String },

    /// The client's outbound channel is gone, i.e. the connection is dead.
    #[error("client disconnected")]
    ClientGone,

    #[error("unknown client: {id}")]
    UnknownClient { id: String },
}

impl RealtimeError {
    pub fn admission_refused(reason: impl Into<String>) -> Self {
        Self::AdmissionRefused {
            reason: reason.into(),
        }
    }

    pub fn unknown_client(id: impl Into<String>) -> Self {
        Self::UnknownClient { id: id.into() }
    }
}

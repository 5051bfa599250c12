use crate::model::RequestId;

/// Reasons a send can end without a successful recording.
///
/// `Transport` is the only variant that comes with a recorded failure response;
/// all others abort the send before anything is persisted, except `Store` which
/// signals that the recording itself failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("request not found: {0}")]
    NotFound(RequestId),

    #[error("request could not be resolved: {0}")]
    ResolutionFailure(String),

    #[error("{0}")]
    Transport(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("send cancelled before dispatch")]
    Cancelled,
}

use crate::media::MediaError;
use crate::session::RoomId;
use crate::transport::{PeerId, TransportError};
use thiserror::Error;

/// Failures of a call-session action
///
/// None of these are fatal: the session stays consistent and the action can
/// be retried by the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("failed to access media devices: {0}")]
    MediaAccess(#[from] MediaError),

    #[error("video call system is not ready: {0}")]
    TransportInit(String),

    #[error("invalid room: {0}")]
    InvalidRoom(String),

    #[error("connection with {peer} failed: {reason}")]
    Connection { peer: PeerId, reason: String },

    #[error("already connected to room {0}")]
    AlreadyInRoom(RoomId),

    #[error("could not copy room link: {0}")]
    Clipboard(String),

    #[error("call session has shut down")]
    SessionClosed,
}

impl CallError {
    pub fn connection(peer: &PeerId, err: &TransportError) -> Self {
        Self::Connection {
            peer: peer.clone(),
            reason: err.to_string(),
        }
    }
}

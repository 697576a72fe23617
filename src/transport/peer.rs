use super::event::{EventSink, TransportSink};
use crate::media::MediaHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Opaque identifier of a peer on the transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random id of the form `<prefix><7 alphanumerics>`
    pub fn generate(prefix: &str) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", prefix, &suffix[..7]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, used in user-facing labels
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What a call carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPurpose {
    /// Camera and microphone; mirrored into room membership
    Media,
    /// Screen capture offered alongside an existing media call
    ScreenShare,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("peer {0} is unavailable")]
    PeerUnavailable(PeerId),

    #[error("peer id {0} is already taken")]
    IdTaken(PeerId),

    #[error("connection already closed")]
    Closed,

    #[error("transport failure: {0}")]
    Failed(String),
}

/// A single peer-to-peer call
///
/// Lifecycle events are not exposed here; they are delivered through the
/// `EventSink` handed over on `PeerTransport::call` or `Connection::answer`.
pub trait Connection: Send + Sync + fmt::Debug {
    /// The remote peer
    fn peer(&self) -> &PeerId;

    fn purpose(&self) -> CallPurpose;

    /// Accept an inbound call, sending `media` back to the caller
    fn answer(&self, media: &MediaHandle, events: EventSink) -> Result<(), TransportError>;

    /// Hang up. Closing twice returns `TransportError::Closed`.
    fn close(&self) -> Result<(), TransportError>;
}

/// Peer-to-peer connection layer
///
/// Owns the local identity, places outgoing calls and reports inbound ones.
#[async_trait::async_trait]
pub trait PeerTransport: Send + Sync {
    /// Local peer id, `None` until the transport is registered
    fn identity(&self) -> Option<PeerId>;

    /// Place a call to `peer` carrying `media`
    async fn call(
        &self,
        peer: &PeerId,
        media: &MediaHandle,
        purpose: CallPurpose,
        events: EventSink,
    ) -> Result<Arc<dyn Connection>, TransportError>;

    /// Route inbound calls and transport-level errors to `sink`
    fn listen(&self, sink: TransportSink);
}

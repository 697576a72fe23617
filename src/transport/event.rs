use super::peer::{CallPurpose, Connection, PeerId};
use crate::media::{MediaHandle, MediaId};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Session-unique id of a wired connection
///
/// Every call or answer gets a fresh id, so events from a connection that was
/// already closed or replaced can be told apart from live ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// Lifecycle of one connection, in delivery order:
/// `Opened`, then zero or more `Stream`, then `Closed` or `Errored`.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    Opened,
    Stream(MediaHandle),
    Closed,
    Errored(String),
}

/// Everything a call session reacts to besides direct user actions
#[derive(Debug)]
pub enum SessionEvent {
    /// A remote peer is calling us
    Incoming(Arc<dyn Connection>),

    /// Lifecycle event of a wired connection
    Connection {
        link: LinkId,
        peer: PeerId,
        purpose: CallPurpose,
        event: ConnectionEvent,
    },

    /// A screen capture track ended outside our control
    ScreenShareEnded { media: MediaId },

    /// The transport itself failed (identity lost, server unreachable, ...)
    TransportError(String),
}

/// Per-connection event sender handed to the transport
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
    link: LinkId,
    peer: PeerId,
    purpose: CallPurpose,
}

impl EventSink {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<SessionEvent>,
        link: LinkId,
        peer: PeerId,
        purpose: CallPurpose,
    ) -> Self {
        Self {
            tx,
            link,
            peer,
            purpose,
        }
    }

    pub fn link(&self) -> LinkId {
        self.link
    }

    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    /// Queue an event. Returns false once the session is gone.
    pub fn emit(&self, event: ConnectionEvent) -> bool {
        self.tx
            .send(SessionEvent::Connection {
                link: self.link,
                peer: self.peer.clone(),
                purpose: self.purpose,
                event,
            })
            .is_ok()
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("link", &self.link)
            .field("peer", &self.peer)
            .field("purpose", &self.purpose)
            .finish()
    }
}

/// Transport-wide event sender: inbound calls and transport failures
#[derive(Clone)]
pub struct TransportSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl TransportSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    pub fn incoming(&self, connection: Arc<dyn Connection>) -> bool {
        self.tx.send(SessionEvent::Incoming(connection)).is_ok()
    }

    pub fn error(&self, reason: impl Into<String>) -> bool {
        self.tx.send(SessionEvent::TransportError(reason.into())).is_ok()
    }
}

impl fmt::Debug for TransportSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSink").finish_non_exhaustive()
    }
}

// Shared fixtures for call session tests
//
// `MockTransport` records every call it is asked to place and keeps the
// connections around so a test can push lifecycle events into the session
// exactly the way a real transport callback would.

#![allow(dead_code)]

use mero_calls::media::{MediaHandle, SyntheticMediaSource};
use mero_calls::session::{CallSession, NoticeLevel, SessionConfig, ShareableLocation};
use mero_calls::transport::{
    CallPurpose, Connection, ConnectionEvent, EventSink, PeerId, PeerTransport, TransportError,
    TransportSink,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const ORIGIN: &str = "http://localhost:3000";
pub const PATH: &str = "/experts";

#[derive(Debug)]
pub struct MockConnection {
    peer: PeerId,
    purpose: CallPurpose,
    events: Mutex<Option<EventSink>>,
    closed: AtomicBool,
    refuse_answer: bool,
}

impl MockConnection {
    fn new(peer: PeerId, purpose: CallPurpose, events: Option<EventSink>) -> Self {
        Self {
            peer,
            purpose,
            events: Mutex::new(events),
            closed: AtomicBool::new(false),
            refuse_answer: false,
        }
    }

    /// Deliver `event` through the sink the session wired for this call
    pub fn emit(&self, event: ConnectionEvent) -> bool {
        match self.events.lock().unwrap().as_ref() {
            Some(sink) => sink.emit(event),
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Connection for MockConnection {
    fn peer(&self) -> &PeerId {
        &self.peer
    }

    fn purpose(&self) -> CallPurpose {
        self.purpose
    }

    fn answer(&self, _media: &MediaHandle, events: EventSink) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        if self.refuse_answer {
            return Err(TransportError::Failed("caller hung up".to_string()));
        }
        *self.events.lock().unwrap() = Some(events);
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockTransport {
    identity: Option<PeerId>,
    failing: Mutex<HashSet<PeerId>>,
    calls: Mutex<Vec<(PeerId, CallPurpose)>>,
    connections: Mutex<Vec<Arc<MockConnection>>>,
    listener: Mutex<Option<TransportSink>>,
}

impl MockTransport {
    pub fn new(identity: &str) -> Arc<Self> {
        Arc::new(Self {
            identity: Some(PeerId::new(identity)),
            ..Default::default()
        })
    }

    pub fn without_identity() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every later call to `peer` fail
    pub fn fail_calls_to(&self, peer: &str) {
        self.failing.lock().unwrap().insert(PeerId::new(peer));
    }

    pub fn calls(&self) -> Vec<(PeerId, CallPurpose)> {
        self.calls.lock().unwrap().clone()
    }

    /// Most recent connection with `peer` for `purpose`, placed or received
    pub fn connection(&self, peer: &str, purpose: CallPurpose) -> Option<Arc<MockConnection>> {
        self.connections
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.peer.as_str() == peer && c.purpose == purpose)
            .cloned()
    }

    /// Simulate `peer` calling us
    pub fn ring(&self, peer: &str, purpose: CallPurpose) -> Arc<MockConnection> {
        self.deliver(MockConnection::new(PeerId::new(peer), purpose, None))
    }

    /// Simulate `peer` calling us on a line that cannot be answered
    pub fn ring_unanswerable(&self, peer: &str, purpose: CallPurpose) -> Arc<MockConnection> {
        let mut connection = MockConnection::new(PeerId::new(peer), purpose, None);
        connection.refuse_answer = true;
        self.deliver(connection)
    }

    fn deliver(&self, connection: MockConnection) -> Arc<MockConnection> {
        let connection = Arc::new(connection);
        self.connections.lock().unwrap().push(Arc::clone(&connection));

        let listener = self.listener.lock().unwrap().clone();
        let delivered = listener
            .map(|sink| sink.incoming(connection.clone()))
            .unwrap_or(false);
        assert!(delivered, "session is not listening");
        connection
    }

    /// Report a transport-wide failure
    pub fn fail(&self, reason: &str) {
        if let Some(sink) = self.listener.lock().unwrap().as_ref() {
            sink.error(reason);
        }
    }
}

#[async_trait::async_trait]
impl PeerTransport for MockTransport {
    fn identity(&self) -> Option<PeerId> {
        self.identity.clone()
    }

    async fn call(
        &self,
        peer: &PeerId,
        _media: &MediaHandle,
        purpose: CallPurpose,
        events: EventSink,
    ) -> Result<Arc<dyn Connection>, TransportError> {
        self.calls.lock().unwrap().push((peer.clone(), purpose));
        if self.failing.lock().unwrap().contains(peer) {
            return Err(TransportError::PeerUnavailable(peer.clone()));
        }

        let connection = Arc::new(MockConnection::new(peer.clone(), purpose, Some(events)));
        self.connections.lock().unwrap().push(Arc::clone(&connection));
        Ok(connection)
    }

    fn listen(&self, sink: TransportSink) {
        *self.listener.lock().unwrap() = Some(sink);
    }
}

pub fn location() -> Box<ShareableLocation> {
    Box::new(ShareableLocation::new(ORIGIN, PATH))
}

pub fn session_with(transport: Arc<MockTransport>, media: Arc<SyntheticMediaSource>) -> CallSession {
    CallSession::new(SessionConfig::default(), transport, media, location())
}

/// Session for `identity` backed by a mock transport and synthetic devices
pub fn session(identity: &str) -> (CallSession, Arc<MockTransport>, Arc<SyntheticMediaSource>) {
    let transport = MockTransport::new(identity);
    let media = Arc::new(SyntheticMediaSource::recording());
    let session = session_with(Arc::clone(&transport), Arc::clone(&media));
    (session, transport, media)
}

pub fn has_notice(session: &mut CallSession, level: NoticeLevel, text: &str) -> bool {
    session
        .notices()
        .iter()
        .any(|n| n.level == level && n.message.contains(text))
}

/// A stream as it would arrive from a remote peer
pub fn remote_stream() -> MediaHandle {
    use mero_calls::media::{MediaKind, MediaTrack, TrackKind};
    MediaHandle::new(
        MediaKind::Remote,
        vec![
            MediaTrack::new(TrackKind::Audio),
            MediaTrack::new(TrackKind::Video),
        ],
    )
}

//! In-process peer network
//!
//! Every `LocalTransport` registers its id on a shared `LocalNetwork`; calls
//! between them are delivered directly through the sessions' event queues.
//! Answering a call emits `Opened` followed by `Stream` on both ends, closing
//! either end emits `Closed` on both.

use super::event::{ConnectionEvent, EventSink, TransportSink};
use super::peer::{CallPurpose, Connection, PeerId, PeerTransport, TransportError};
use crate::media::MediaHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Shared registry of local transports keyed by peer id
#[derive(Clone, Default)]
pub struct LocalNetwork {
    peers: Arc<Mutex<HashMap<PeerId, Option<TransportSink>>>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids currently registered
    pub fn peers(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self
            .peers
            .lock()
            .map(|peers| peers.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    fn register(&self, id: &PeerId) -> Result<(), TransportError> {
        let mut peers = self.lock()?;
        if peers.contains_key(id) {
            return Err(TransportError::IdTaken(id.clone()));
        }
        peers.insert(id.clone(), None);
        Ok(())
    }

    fn unregister(&self, id: &PeerId) {
        if let Ok(mut peers) = self.peers.lock() {
            peers.remove(id);
        }
    }

    fn set_listener(&self, id: &PeerId, sink: TransportSink) {
        if let Ok(mut peers) = self.peers.lock() {
            if let Some(slot) = peers.get_mut(id) {
                *slot = Some(sink);
            }
        }
    }

    fn listener(&self, id: &PeerId) -> Result<TransportSink, TransportError> {
        self.lock()?
            .get(id)
            .and_then(|slot| slot.clone())
            .ok_or_else(|| TransportError::PeerUnavailable(id.clone()))
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<PeerId, Option<TransportSink>>>, TransportError>
    {
        self.peers
            .lock()
            .map_err(|_| TransportError::Failed("peer registry poisoned".to_string()))
    }
}

/// Transport endpoint registered on a `LocalNetwork`
pub struct LocalTransport {
    id: PeerId,
    network: LocalNetwork,
}

impl LocalTransport {
    /// Register `id` on the network
    pub fn connect(network: &LocalNetwork, id: PeerId) -> Result<Self, TransportError> {
        network.register(&id)?;
        info!("Local transport registered as {}", id);
        Ok(Self {
            id,
            network: network.clone(),
        })
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        debug!("Local transport {} unregistered", self.id);
        self.network.unregister(&self.id);
    }
}

#[async_trait::async_trait]
impl PeerTransport for LocalTransport {
    fn identity(&self) -> Option<PeerId> {
        Some(self.id.clone())
    }

    async fn call(
        &self,
        peer: &PeerId,
        media: &MediaHandle,
        purpose: CallPurpose,
        events: EventSink,
    ) -> Result<Arc<dyn Connection>, TransportError> {
        let remote = self.network.listener(peer)?;

        let line = Arc::new(CallLine {
            caller: self.id.clone(),
            callee: peer.clone(),
            purpose,
            caller_media: media.clone(),
            caller_events: events,
            callee_events: Mutex::new(None),
            closed: AtomicBool::new(false),
        });

        let inbound = LocalConnection {
            line: Arc::clone(&line),
            side: Side::Callee,
        };
        if !remote.incoming(Arc::new(inbound)) {
            return Err(TransportError::PeerUnavailable(peer.clone()));
        }

        debug!("{} is calling {} ({:?})", self.id, peer, purpose);
        Ok(Arc::new(LocalConnection {
            line,
            side: Side::Caller,
        }))
    }

    fn listen(&self, sink: TransportSink) {
        self.network.set_listener(&self.id, sink);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Caller,
    Callee,
}

struct CallLine {
    caller: PeerId,
    callee: PeerId,
    purpose: CallPurpose,
    caller_media: MediaHandle,
    caller_events: EventSink,
    callee_events: Mutex<Option<EventSink>>,
    closed: AtomicBool,
}

/// One end of an in-process call
pub struct LocalConnection {
    line: Arc<CallLine>,
    side: Side,
}

impl std::fmt::Debug for LocalConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalConnection")
            .field("caller", &self.line.caller)
            .field("callee", &self.line.callee)
            .field("side", &self.side)
            .field("purpose", &self.line.purpose)
            .finish()
    }
}

impl Connection for LocalConnection {
    fn peer(&self) -> &PeerId {
        match self.side {
            Side::Caller => &self.line.callee,
            Side::Callee => &self.line.caller,
        }
    }

    fn purpose(&self) -> CallPurpose {
        self.line.purpose
    }

    fn answer(&self, media: &MediaHandle, events: EventSink) -> Result<(), TransportError> {
        if self.side == Side::Caller {
            return Err(TransportError::Failed(
                "cannot answer an outgoing call".to_string(),
            ));
        }
        if self.line.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        {
            let mut slot = self
                .line
                .callee_events
                .lock()
                .map_err(|_| TransportError::Failed("call state poisoned".to_string()))?;
            *slot = Some(events.clone());
        }

        events.emit(ConnectionEvent::Opened);
        events.emit(ConnectionEvent::Stream(self.line.caller_media.as_remote()));

        let caller = &self.line.caller_events;
        caller.emit(ConnectionEvent::Opened);
        caller.emit(ConnectionEvent::Stream(media.as_remote()));
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.line.closed.swap(true, Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        self.line.caller_events.emit(ConnectionEvent::Closed);
        if let Ok(slot) = self.line.callee_events.lock() {
            if let Some(callee) = slot.as_ref() {
                callee.emit(ConnectionEvent::Closed);
            }
        }
        Ok(())
    }
}

use super::config::SessionConfig;
use super::location::{Clipboard, RoomLocation};
use super::notice::{Notice, NoticeBoard};
use super::participant::{Participant, Roster};
use super::room::{RoomId, RoomState, ScreenShareState};
use super::snapshot::{ParticipantView, RoomSnapshot};
use crate::error::CallError;
use crate::media::{MediaConstraints, MediaDeviceSource, MediaHandle, MediaId};
use crate::transport::{
    CallPurpose, Connection, ConnectionEvent, EventSink, LinkId, PeerId, PeerTransport,
    SessionEvent, TransportSink,
};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Outgoing,
    Incoming,
}

/// A registered connection
struct Link {
    id: LinkId,
    direction: Direction,
    connection: Arc<dyn Connection>,
}

/// What the local user sees of their own media
#[derive(Debug, Clone, Default)]
pub struct LocalDisplay {
    /// Own camera preview
    pub preview: Option<MediaHandle>,
    /// Own screen capture preview
    pub screen: Option<MediaHandle>,
}

/// One user's presence in a group video call
///
/// Owns room membership, local media and the connection registry. User
/// actions are the async methods below; transport and device callbacks arrive
/// as `SessionEvent`s on an internal queue and are applied, in order, by
/// `dispatch`. Nothing outside the session mutates its state.
pub struct CallSession {
    /// Session configuration
    config: SessionConfig,

    transport: Arc<dyn PeerTransport>,
    media: Arc<dyn MediaDeviceSource>,
    location: Box<dyn RoomLocation>,

    state: RoomState,
    room_id: Option<RoomId>,
    roster: Roster,

    /// Media calls by peer
    links: HashMap<PeerId, Link>,

    /// Screen-share calls carrying our capture, by peer
    offered_screens: HashMap<PeerId, Link>,

    /// Screen-share calls carrying a peer's capture, by peer
    received_screens: HashMap<PeerId, Link>,
    next_link: u64,

    local_media: Option<MediaHandle>,
    screen: Option<MediaHandle>,
    display: LocalDisplay,

    /// Local mute preference, applied to every newly acquired stream
    audio_muted: bool,
    video_muted: bool,

    notices: NoticeBoard,

    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl CallSession {
    /// Create a session and start listening for inbound calls
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn PeerTransport>,
        media: Arc<dyn MediaDeviceSource>,
        location: Box<dyn RoomLocation>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        transport.listen(TransportSink::new(events_tx.clone()));

        match transport.identity() {
            Some(id) => info!("Call session opened for {} (media: {})", id, media.name()),
            None => warn!("Call session opened without a transport identity"),
        }

        let notices = NoticeBoard::new(config.notice_ttl, config.error_ttl);
        Self {
            config,
            transport,
            media,
            location,
            state: RoomState::Idle,
            room_id: None,
            roster: Roster::new(),
            links: HashMap::new(),
            offered_screens: HashMap::new(),
            received_screens: HashMap::new(),
            next_link: 0,
            local_media: None,
            screen: None,
            display: LocalDisplay::default(),
            audio_muted: false,
            video_muted: false,
            notices,
            events_tx,
            events_rx,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn identity(&self) -> Option<PeerId> {
        self.transport.identity()
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn participant(&self, id: &PeerId) -> Option<&Participant> {
        self.roster.get(id)
    }

    pub fn local_media(&self) -> Option<&MediaHandle> {
        self.local_media.as_ref()
    }

    pub fn display(&self) -> &LocalDisplay {
        &self.display
    }

    pub fn screen_share_state(&self) -> ScreenShareState {
        if self.screen.is_some() {
            ScreenShareState::Sharing
        } else {
            ScreenShareState::Idle
        }
    }

    pub fn is_muted(&self) -> bool {
        self.audio_muted
    }

    pub fn is_video_off(&self) -> bool {
        self.video_muted
    }

    /// Peers with a live media connection
    pub fn connected_peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self.links.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Peers our screen capture is currently offered to
    pub fn screen_share_peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self.offered_screens.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Peers whose screen share we are currently receiving
    pub fn received_screen_peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self.received_screens.keys().cloned().collect();
        peers.sort();
        peers
    }

    pub fn presets(&self) -> &[String] {
        &self.config.presets
    }

    /// Room id of the "solo call": a room only we can be in
    pub fn solo_room_id(&self) -> Option<RoomId> {
        self.identity().map(|id| RoomId::new(format!("self-{}", id)))
    }

    pub fn notices(&mut self) -> Vec<Notice> {
        self.notices.active()
    }

    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        self.notices.dismiss(id)
    }

    pub fn snapshot(&mut self) -> RoomSnapshot {
        let identity = self.identity();
        RoomSnapshot {
            participants: self
                .roster
                .iter()
                .map(|p| ParticipantView::new(p, identity.as_ref()))
                .collect(),
            identity,
            room_id: self.room_id.clone(),
            state: self.state,
            screen_share: self.screen_share_state(),
            audio_muted: self.audio_muted,
            video_muted: self.video_muted,
            notices: self.notices.active(),
            link: self.room_id.as_ref().map(|room| self.location.link(room)),
        }
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    /// Open a room under `requested`, or a generated id, with ourselves as the
    /// only member
    pub async fn create_room(&mut self, requested: Option<RoomId>) -> Result<RoomId, CallError> {
        if let Some(current) = &self.room_id {
            let err = CallError::AlreadyInRoom(current.clone());
            return Err(self.fail("Failed to create room", err));
        }
        let Some(identity) = self.identity() else {
            let err = CallError::TransportInit("peer identity not assigned yet".to_string());
            return Err(self.fail("Failed to create room", err));
        };

        let room = requested
            .map(|room| RoomId::new(room.as_str().trim()))
            .filter(|room| !room.as_str().is_empty())
            .unwrap_or_else(|| RoomId::generate(&self.config.room_prefix));

        self.state = RoomState::Connecting;
        let local = match self.ensure_local_media().await {
            Ok(local) => local,
            Err(e) => {
                self.state = RoomState::Idle;
                return Err(e);
            }
        };

        self.enter_room(room.clone(), identity, local);
        info!("Created room with ID: {}", room);
        self.notices
            .info(format!("Room {} created successfully", room));

        Ok(room)
    }

    /// Join `room`: the room id is the peer id of whoever hosts it
    pub async fn join_room(&mut self, room: &str) -> Result<(), CallError> {
        let room = room.trim();
        if room.is_empty() {
            let err = CallError::InvalidRoom("room id is empty".to_string());
            return Err(self.fail("Please enter a valid room ID", err));
        }
        let Some(identity) = self.identity() else {
            let err = CallError::InvalidRoom("video call system is not initialised".to_string());
            return Err(self.fail("Please enter a valid room ID", err));
        };
        if let Some(current) = &self.room_id {
            let err = CallError::AlreadyInRoom(current.clone());
            return Err(self.fail("Failed to join the room", err));
        }

        let room = RoomId::new(room);
        self.state = RoomState::Connecting;
        let local = match self.ensure_local_media().await {
            Ok(local) => local,
            Err(e) => {
                self.state = RoomState::Idle;
                return Err(e);
            }
        };

        self.enter_room(room.clone(), identity.clone(), local.clone());

        if room.as_str() != identity.as_str() {
            let peer = PeerId::new(room.as_str());
            let sink = self.wire(peer.clone(), CallPurpose::Media);
            let link = sink.link();

            let result = self
                .transport
                .call(&peer, &local, CallPurpose::Media, sink)
                .await;
            match result {
                Ok(connection) => {
                    debug!("Calling {} on {}", peer, link);
                    self.register(peer, link, Direction::Outgoing, connection);
                }
                Err(e) => {
                    let err = CallError::connection(&peer, &e);
                    return Err(self.fail("Failed to join the room", err));
                }
            }
        }

        info!("Joined room {}", room);
        self.notices
            .info(format!("Joined room {} successfully", room));
        Ok(())
    }

    /// Join the room carried by the shareable location, if any
    pub async fn resume_from_location(&mut self) -> Result<Option<RoomId>, CallError> {
        let Some(room) = self.location.room() else {
            return Ok(None);
        };
        if self.room_id.as_ref() == Some(&room) {
            return Ok(Some(room));
        }

        info!("Resuming room {} from location", room);
        self.join_room(room.as_str()).await?;
        Ok(Some(room))
    }

    /// Accept an inbound call and wire it like an outgoing one
    pub async fn handle_incoming_connection(&mut self, connection: Arc<dyn Connection>) {
        if connection.purpose() == CallPurpose::ScreenShare {
            self.accept_screen_share(connection);
            return;
        }

        let peer = connection.peer().clone();
        info!("Incoming call from: {}", peer);
        self.notices
            .info(format!("Incoming call from User {}", peer.short()));

        let local = match self.ensure_local_media().await {
            Ok(local) => local,
            Err(_) => {
                close_quietly(&peer, connection.as_ref());
                return;
            }
        };

        if self.room_id.is_none() {
            // Callers dial our peer id, so an unsolicited call puts us in our own room
            let Some(identity) = self.identity() else {
                let err = CallError::TransportInit("peer identity not assigned yet".to_string());
                self.fail("Failed to connect to the incoming call", err);
                close_quietly(&peer, connection.as_ref());
                return;
            };
            self.enter_room(RoomId::new(identity.as_str()), identity, local.clone());
        }

        let sink = self.wire(peer.clone(), CallPurpose::Media);
        let link = sink.link();
        if let Err(e) = connection.answer(&local, sink) {
            let err = CallError::connection(&peer, &e);
            self.fail("Failed to connect to the incoming call", err);
            close_quietly(&peer, connection.as_ref());
            return;
        }

        self.register(peer, link, Direction::Incoming, connection);
    }

    /// Hang up everything and release all devices. Safe to call at any time.
    pub fn leave_room(&mut self) {
        let was_in_room = self.room_id.is_some();

        let links = self
            .links
            .drain()
            .chain(self.offered_screens.drain())
            .chain(self.received_screens.drain());
        for (peer, link) in links {
            close_quietly(&peer, link.connection.as_ref());
        }

        if let Some(local) = self.local_media.take() {
            local.stop();
        }
        if let Some(capture) = self.screen.take() {
            capture.stop();
        }
        self.display = LocalDisplay::default();

        self.roster.clear();
        self.room_id = None;
        self.state = RoomState::Idle;
        self.location.set_room(None);

        if was_in_room {
            info!("Left the room");
            self.notices.info("You left the room");
        }
    }

    /// Flip the local microphone. Returns the new muted state, or `None`
    /// when no local media is active.
    pub fn toggle_mute(&mut self) -> Option<bool> {
        let local = self.local_media.clone()?;

        let mut has_audio = false;
        for track in local.audio_tracks() {
            track.toggle();
            has_audio = true;
        }
        let muted = if has_audio {
            !local.audio_enabled()
        } else {
            !self.audio_muted
        };

        self.audio_muted = muted;
        if let Some(identity) = self.identity() {
            self.roster.update(&identity, |p| p.audio_muted = muted);
        }
        debug!("Microphone {}", if muted { "muted" } else { "unmuted" });
        Some(muted)
    }

    /// Flip the local camera. Returns the new "video off" state, or `None`
    /// when no local media is active.
    pub fn toggle_video(&mut self) -> Option<bool> {
        let local = self.local_media.clone()?;

        let mut has_video = false;
        for track in local.video_tracks() {
            track.toggle();
            has_video = true;
        }
        let off = if has_video {
            !local.video_enabled()
        } else {
            !self.video_muted
        };

        self.video_muted = off;
        if let Some(identity) = self.identity() {
            self.roster.update(&identity, |p| p.video_muted = off);
        }
        debug!("Camera {}", if off { "off" } else { "on" });
        Some(off)
    }

    /// Start sharing the screen with every connected peer, or stop sharing
    pub async fn toggle_screen_share(&mut self) -> Result<ScreenShareState, CallError> {
        if self.stop_screen_capture() {
            info!("Screen sharing stopped");
            self.notices.info("Screen sharing stopped");
            return Ok(ScreenShareState::Idle);
        }

        if self.room_id.is_none() {
            let err = CallError::InvalidRoom("not in a room".to_string());
            return Err(self.fail("Failed to share screen", err));
        }

        let result = self
            .media
            .display_media(MediaConstraints::AUDIO_VIDEO)
            .await;
        let capture = match result {
            Ok(capture) => capture,
            Err(e) => return Err(self.fail("Failed to share screen", e.into())),
        };

        self.display.screen = Some(capture.clone());
        self.screen = Some(capture.clone());

        let offers: Vec<(PeerId, EventSink)> = self
            .connected_peers()
            .into_iter()
            .map(|peer| {
                let sink = self.wire(peer.clone(), CallPurpose::ScreenShare);
                (peer, sink)
            })
            .collect();

        let results = join_all(offers.into_iter().map(|(peer, sink)| {
            let transport = Arc::clone(&self.transport);
            let capture = capture.clone();
            async move {
                let link = sink.link();
                let result = transport
                    .call(&peer, &capture, CallPurpose::ScreenShare, sink)
                    .await;
                (peer, link, result)
            }
        }))
        .await;

        for (peer, link, result) in results {
            match result {
                Ok(connection) => {
                    info!("Sharing screen with {}", peer);
                    self.register_screen(peer, link, Direction::Outgoing, connection);
                }
                Err(e) => {
                    self.fail("Error sharing screen", CallError::connection(&peer, &e));
                }
            }
        }

        if let Some(track) = capture.video_tracks().next().cloned() {
            let events = self.events_tx.clone();
            let media = capture.id().clone();
            tokio::spawn(async move {
                track.ended().await;
                let _ = events.send(SessionEvent::ScreenShareEnded { media });
            });
        }

        self.notices.info("Screen sharing started");
        Ok(ScreenShareState::Sharing)
    }

    /// Copy the shareable link of the current room
    pub fn copy_room_link(&mut self, clipboard: &dyn Clipboard) -> Result<String, CallError> {
        let Some(room) = self.room_id.clone() else {
            let err = CallError::InvalidRoom("not in a room".to_string());
            return Err(self.fail("Failed to copy room link", err));
        };

        let link = self.location.link(&room);
        if let Err(e) = clipboard.write_text(&link) {
            return Err(self.fail("Failed to copy room link", CallError::Clipboard(e.0)));
        }

        self.notices.success("Room link copied!");
        Ok(link)
    }

    /// Leave any room and release everything. The session stays usable.
    pub fn close(&mut self) {
        self.leave_room();
        debug!("Call session closed");
    }

    // ------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------

    /// Wait for the next queued event
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Apply every event already queued. Returns how many were applied.
    pub async fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event).await;
            applied += 1;
        }
        applied
    }

    /// Apply one event
    pub async fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Incoming(connection) => {
                self.handle_incoming_connection(connection).await;
            }
            SessionEvent::Connection {
                link,
                peer,
                purpose: CallPurpose::Media,
                event,
            } => self.on_media_event(link, peer, event),
            SessionEvent::Connection {
                link,
                peer,
                purpose: CallPurpose::ScreenShare,
                event,
            } => self.on_screen_event(link, peer, event),
            SessionEvent::ScreenShareEnded { media } => self.on_capture_ended(&media),
            SessionEvent::TransportError(reason) => {
                error!("Transport error: {}", reason);
                self.notices.error(format!("Connection error: {}", reason));
            }
        }
    }

    fn on_media_event(&mut self, link: LinkId, peer: PeerId, event: ConnectionEvent) {
        let direction = match self.links.get(&peer) {
            Some(registered) if registered.id == link => registered.direction,
            _ => {
                debug!("Dropping event from stale {} ({}): {:?}", link, peer, event);
                return;
            }
        };

        match event {
            ConnectionEvent::Opened => {
                if self.roster.ensure(remote_participant(&peer, direction)) {
                    info!("Connection opened with {}", peer);
                }
            }
            ConnectionEvent::Stream(stream) => {
                debug!("Received stream {} from {}", stream.id(), peer);
                self.roster
                    .upsert_stream(&peer, stream, || remote_participant(&peer, direction));
            }
            ConnectionEvent::Closed => {
                info!("Call closed with: {}", peer);
                self.links.remove(&peer);
                self.roster.remove(&peer);
                let screens = [
                    self.offered_screens.remove(&peer),
                    self.received_screens.remove(&peer),
                ];
                for screen in screens.into_iter().flatten() {
                    close_quietly(&peer, screen.connection.as_ref());
                }
                self.notices
                    .info(format!("User {} left the call", peer.short()));
            }
            ConnectionEvent::Errored(reason) => {
                error!("Call error with {}: {}", peer, reason);
                self.notices
                    .error(format!("Call error with {}: {}", peer.short(), reason));
            }
        }
    }

    fn on_screen_event(&mut self, link: LinkId, peer: PeerId, event: ConnectionEvent) {
        let is_live = |links: &HashMap<PeerId, Link>| {
            links.get(&peer).is_some_and(|registered| registered.id == link)
        };
        let direction = if is_live(&self.offered_screens) {
            Direction::Outgoing
        } else if is_live(&self.received_screens) {
            Direction::Incoming
        } else {
            debug!("Dropping screen event from stale {} ({}): {:?}", link, peer, event);
            return;
        };

        match event {
            ConnectionEvent::Opened => debug!("Screen share link open with {}", peer),
            ConnectionEvent::Stream(stream) => {
                // What comes back on our own offer is the peer's camera; ignore it
                if direction == Direction::Incoming {
                    info!("{} is sharing their screen", peer);
                    self.roster.update(&peer, |p| p.screen = Some(stream));
                }
            }
            ConnectionEvent::Closed => match direction {
                Direction::Outgoing => {
                    self.offered_screens.remove(&peer);
                }
                Direction::Incoming => {
                    info!("{} stopped sharing their screen", peer);
                    self.received_screens.remove(&peer);
                    self.roster.update(&peer, |p| p.screen = None);
                }
            },
            ConnectionEvent::Errored(reason) => {
                warn!("Screen share error with {}: {}", peer, reason);
                self.notices
                    .error(format!("Screen share error with {}: {}", peer.short(), reason));
            }
        }
    }

    fn on_capture_ended(&mut self, media: &MediaId) {
        let current = self.screen.as_ref().map(|capture| capture.id());
        if current != Some(media) {
            debug!("Ignoring end of old capture {}", media);
            return;
        }
        info!("Screen capture ended outside the app");
        self.stop_screen_capture();
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn accept_screen_share(&mut self, connection: Arc<dyn Connection>) {
        let peer = connection.peer().clone();
        let local = match (&self.room_id, &self.local_media) {
            (Some(_), Some(local)) => local.clone(),
            _ => {
                debug!("Refusing screen share from {} outside a room", peer);
                close_quietly(&peer, connection.as_ref());
                return;
            }
        };

        let sink = self.wire(peer.clone(), CallPurpose::ScreenShare);
        let link = sink.link();
        if let Err(e) = connection.answer(&local, sink) {
            self.fail("Failed to receive screen share", CallError::connection(&peer, &e));
            close_quietly(&peer, connection.as_ref());
            return;
        }
        self.register_screen(peer, link, Direction::Incoming, connection);
    }

    /// Reuse the active local stream or open a new one
    async fn ensure_local_media(&mut self) -> Result<MediaHandle, CallError> {
        if let Some(local) = &self.local_media {
            if local.is_active() {
                return Ok(local.clone());
            }
        }

        let result = self.media.user_media(MediaConstraints::AUDIO_VIDEO).await;
        let local = match result {
            Ok(local) => local,
            Err(e) => {
                return Err(self.fail("Failed to access camera and microphone", e.into()));
            }
        };

        // Keep track state in line with the flags the user already chose
        local
            .audio_tracks()
            .for_each(|t| t.set_enabled(!self.audio_muted));
        local
            .video_tracks()
            .for_each(|t| t.set_enabled(!self.video_muted));

        self.display.preview = Some(local.clone());
        self.local_media = Some(local.clone());
        Ok(local)
    }

    fn enter_room(&mut self, room: RoomId, identity: PeerId, local: MediaHandle) {
        let mut me = Participant::new(identity, "You").with_stream(local);
        me.audio_muted = self.audio_muted;
        me.video_muted = self.video_muted;

        self.roster.reset_to(me);
        self.location.set_room(Some(&room));
        self.room_id = Some(room);
        self.state = RoomState::Connected;
    }

    fn wire(&mut self, peer: PeerId, purpose: CallPurpose) -> EventSink {
        self.next_link += 1;
        EventSink::new(self.events_tx.clone(), LinkId(self.next_link), peer, purpose)
    }

    fn register(
        &mut self,
        peer: PeerId,
        id: LinkId,
        direction: Direction,
        connection: Arc<dyn Connection>,
    ) {
        let link = Link {
            id,
            direction,
            connection,
        };
        if let Some(replaced) = self.links.insert(peer.clone(), link) {
            debug!("Replacing {} with {} for {}", replaced.id, id, peer);
            close_quietly(&peer, replaced.connection.as_ref());
        }
    }

    fn register_screen(
        &mut self,
        peer: PeerId,
        id: LinkId,
        direction: Direction,
        connection: Arc<dyn Connection>,
    ) {
        let link = Link {
            id,
            direction,
            connection,
        };
        let screens = match direction {
            Direction::Outgoing => &mut self.offered_screens,
            Direction::Incoming => &mut self.received_screens,
        };
        if let Some(replaced) = screens.insert(peer.clone(), link) {
            debug!("Replacing screen {} with {} for {}", replaced.id, id, peer);
            close_quietly(&peer, replaced.connection.as_ref());
        }
    }

    /// Stop our own capture and hang up the screen calls we offered.
    /// Returns false when nothing was being shared.
    fn stop_screen_capture(&mut self) -> bool {
        let Some(capture) = self.screen.take() else {
            return false;
        };
        capture.stop();
        self.display.screen = None;

        for (peer, link) in self.offered_screens.drain() {
            close_quietly(&peer, link.connection.as_ref());
        }
        true
    }

    /// Log and surface a failure, handing the error back to the caller
    fn fail(&mut self, context: &str, err: CallError) -> CallError {
        error!("{}: {}", context, err);
        self.notices.error(format!("{}: {}", context, err));
        err
    }
}

impl Drop for CallSession {
    fn drop(&mut self) {
        if self.room_id.is_some() || self.local_media.is_some() {
            self.close();
        }
    }
}

fn remote_participant(peer: &PeerId, direction: Direction) -> Participant {
    let name = match direction {
        Direction::Outgoing => format!("Peer {}", peer.short()),
        Direction::Incoming => format!("User {}", peer.short()),
    };
    Participant::new(peer.clone(), name)
}

fn close_quietly(peer: &PeerId, connection: &dyn Connection) {
    if let Err(e) = connection.close() {
        warn!("Error closing connection to {}: {}", peer, e);
    }
}

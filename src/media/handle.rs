use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Unique identifier of a live media handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(String);

impl MediaId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a media handle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Camera and microphone
    UserMedia,
    /// Screen capture
    Display,
    /// Media delivered by a remote peer
    Remote,
}

/// Track type inside a media handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug)]
struct TrackState {
    enabled: AtomicBool,
    ended: watch::Sender<bool>,
}

/// A single audio or video track
///
/// Clones share state: disabling or ending a clone affects every copy.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    state: Arc<TrackState>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind) -> Self {
        let (ended, _) = watch::channel(false);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            state: Arc::new(TrackState {
                enabled: AtomicBool::new(true),
                ended,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Flip the enabled flag, returning the new value
    pub fn toggle(&self) -> bool {
        !self.state.enabled.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        !*self.state.ended.borrow()
    }

    /// End the track. Used both for our own stop and for an external end
    /// (e.g. the OS "stop sharing" button).
    pub fn end(&self) {
        self.state.ended.send_replace(true);
    }

    /// Resolves once the track has ended
    pub async fn ended(&self) {
        let mut rx = self.state.ended.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|ended| *ended).await;
    }
}

/// A live media stream: a set of tracks with a shared identity
#[derive(Debug, Clone)]
pub struct MediaHandle {
    id: MediaId,
    kind: MediaKind,
    tracks: Arc<Vec<MediaTrack>>,
}

impl MediaHandle {
    pub fn new(kind: MediaKind, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: MediaId::generate(),
            kind,
            tracks: Arc::new(tracks),
        }
    }

    pub fn id(&self) -> &MediaId {
        &self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Video)
    }

    /// True when at least one audio track is enabled
    pub fn audio_enabled(&self) -> bool {
        self.audio_tracks().any(MediaTrack::is_enabled)
    }

    /// True when at least one video track is enabled
    pub fn video_enabled(&self) -> bool {
        self.video_tracks().any(MediaTrack::is_enabled)
    }

    /// True while any track is still live
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    /// Stop every track
    pub fn stop(&self) {
        for track in self.tracks.iter() {
            track.end();
        }
    }

    /// Re-label a local handle as seen by a remote peer. Tracks stay shared.
    pub fn as_remote(&self) -> Self {
        Self {
            id: self.id.clone(),
            kind: MediaKind::Remote,
            tracks: Arc::clone(&self.tracks),
        }
    }
}

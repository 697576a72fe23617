use super::handle::{MediaHandle, MediaKind, MediaTrack, TrackKind};
use super::source::{MediaConstraints, MediaDeviceSource, MediaError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Device source that fabricates live tracks without touching hardware
///
/// Access can be revoked at runtime to exercise permission failures.
#[derive(Debug, Default)]
pub struct SyntheticMediaSource {
    deny_camera: AtomicBool,
    deny_display: AtomicBool,
    opened: AtomicUsize,
    /// Only set by `recording`
    handles: Option<Mutex<Vec<MediaHandle>>>,
}

impl SyntheticMediaSource {
    /// Source that keeps nothing after handing a handle out
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that also remembers every handle it opens, see `handles`
    pub fn recording() -> Self {
        Self {
            handles: Some(Mutex::new(Vec::new())),
            ..Self::default()
        }
    }

    /// Make every following `user_media` call fail with `Denied`
    pub fn deny_camera(&self, deny: bool) {
        self.deny_camera.store(deny, Ordering::SeqCst);
    }

    /// Make every following `display_media` call fail with `Denied`
    pub fn deny_display(&self, deny: bool) {
        self.deny_display.store(deny, Ordering::SeqCst);
    }

    /// Number of handles opened so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Every handle this source produced, oldest first. Empty unless
    /// created with `recording`.
    pub fn handles(&self) -> Vec<MediaHandle> {
        self.handles
            .as_ref()
            .and_then(|handles| handles.lock().ok().map(|h| h.clone()))
            .unwrap_or_default()
    }

    fn open(&self, kind: MediaKind, constraints: MediaConstraints) -> MediaHandle {
        let mut tracks = Vec::with_capacity(2);
        if constraints.audio {
            tracks.push(MediaTrack::new(TrackKind::Audio));
        }
        if constraints.video {
            tracks.push(MediaTrack::new(TrackKind::Video));
        }

        let handle = MediaHandle::new(kind, tracks);
        self.opened.fetch_add(1, Ordering::SeqCst);
        if let Some(Ok(mut handles)) = self.handles.as_ref().map(Mutex::lock) {
            handles.push(handle.clone());
        }

        debug!("Opened synthetic {:?} media {}", kind, handle.id());
        handle
    }
}

#[async_trait::async_trait]
impl MediaDeviceSource for SyntheticMediaSource {
    async fn user_media(&self, constraints: MediaConstraints) -> Result<MediaHandle, MediaError> {
        if self.deny_camera.load(Ordering::SeqCst) {
            return Err(MediaError::Denied("camera and microphone".to_string()));
        }
        if !constraints.audio && !constraints.video {
            return Err(MediaError::Unavailable("no tracks requested".to_string()));
        }
        Ok(self.open(MediaKind::UserMedia, constraints))
    }

    async fn display_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaHandle, MediaError> {
        if self.deny_display.load(Ordering::SeqCst) {
            return Err(MediaError::Denied("screen capture".to_string()));
        }
        if !constraints.video {
            return Err(MediaError::Unavailable("display capture needs video".to_string()));
        }
        Ok(self.open(MediaKind::Display, constraints))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

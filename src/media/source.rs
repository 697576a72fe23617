use super::handle::MediaHandle;
use thiserror::Error;

/// Which tracks to request from a device source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl MediaConstraints {
    pub const AUDIO_VIDEO: Self = Self {
        video: true,
        audio: true,
    };
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self::AUDIO_VIDEO
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission denied: {0}")]
    Denied(String),

    #[error("device unavailable: {0}")]
    Unavailable(String),

    #[error("not supported on this platform")]
    Unsupported,
}

/// Local capture devices (camera, microphone, screen)
///
/// Implementations:
/// - Synthetic: generated tracks, for tests and the in-process server
/// - Browser/native capture backends live outside this crate
#[async_trait::async_trait]
pub trait MediaDeviceSource: Send + Sync {
    /// Open camera and/or microphone
    async fn user_media(&self, constraints: MediaConstraints) -> Result<MediaHandle, MediaError>;

    /// Open a screen capture
    async fn display_media(&self, constraints: MediaConstraints)
        -> Result<MediaHandle, MediaError>;

    /// Source name for logging
    fn name(&self) -> &str;
}

use super::notice::Notice;
use super::participant::Participant;
use super::room::{RoomId, RoomState, ScreenShareState};
use crate::media::MediaId;
use crate::transport::PeerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of a call session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// Local peer id, if the transport is registered
    pub identity: Option<PeerId>,

    /// Current room, if any
    pub room_id: Option<RoomId>,

    pub state: RoomState,

    pub screen_share: ScreenShareState,

    /// Local microphone muted
    pub audio_muted: bool,

    /// Local camera off
    pub video_muted: bool,

    /// Room members in join order, local user included
    pub participants: Vec<ParticipantView>,

    /// Notices currently visible
    pub notices: Vec<Notice>,

    /// Shareable link for the current room
    pub link: Option<String>,
}

/// Serializable participant summary (media handles reduced to their ids)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: PeerId,
    pub name: String,
    pub is_local: bool,
    pub stream: Option<MediaId>,
    pub screen: Option<MediaId>,
    pub video_muted: bool,
    pub audio_muted: bool,
    pub joined_at: DateTime<Utc>,
}

impl ParticipantView {
    pub fn new(participant: &Participant, local: Option<&PeerId>) -> Self {
        Self {
            id: participant.id.clone(),
            name: participant.name.clone(),
            is_local: local == Some(&participant.id),
            stream: participant.stream.as_ref().map(|s| s.id().clone()),
            screen: participant.screen.as_ref().map(|s| s.id().clone()),
            video_muted: participant.video_muted,
            audio_muted: participant.audio_muted,
            joined_at: participant.joined_at,
        }
    }
}

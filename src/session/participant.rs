use crate::media::MediaHandle;
use crate::transport::PeerId;
use chrono::{DateTime, Utc};

/// A member of the current room
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: PeerId,
    pub name: String,
    /// Camera/microphone stream, absent until a connection delivers one
    pub stream: Option<MediaHandle>,
    /// Screen share offered by this participant, if any
    pub screen: Option<MediaHandle>,
    pub video_muted: bool,
    pub audio_muted: bool,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(id: PeerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            stream: None,
            screen: None,
            video_muted: false,
            audio_muted: false,
            joined_at: Utc::now(),
        }
    }

    pub fn with_stream(mut self, stream: MediaHandle) -> Self {
        self.stream = Some(stream);
        self
    }
}

/// Room membership, in join order
///
/// Every change is a replace-by-id or filter-by-id, so ids stay unique.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.members.iter()
    }

    pub fn get(&self, id: &PeerId) -> Option<&Participant> {
        self.members.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.get(id).is_some()
    }

    /// Replace membership with a single participant
    pub fn reset_to(&mut self, participant: Participant) {
        self.members.clear();
        self.members.push(participant);
    }

    /// Insert `participant` unless its id is already present.
    /// Returns true when inserted.
    pub fn ensure(&mut self, participant: Participant) -> bool {
        if self.contains(&participant.id) {
            return false;
        }
        self.members.push(participant);
        true
    }

    /// Attach `stream` to `id`, inserting a participant built by `make` when
    /// absent. Returns true when a new participant was inserted.
    pub fn upsert_stream(
        &mut self,
        id: &PeerId,
        stream: MediaHandle,
        make: impl FnOnce() -> Participant,
    ) -> bool {
        match self.members.iter_mut().find(|p| &p.id == id) {
            Some(existing) => {
                existing.stream = Some(stream);
                false
            }
            None => {
                self.members.push(make().with_stream(stream));
                true
            }
        }
    }

    /// Apply `f` to the participant with `id`, if present
    pub fn update(&mut self, id: &PeerId, f: impl FnOnce(&mut Participant)) -> bool {
        match self.members.iter_mut().find(|p| &p.id == id) {
            Some(participant) => {
                f(participant);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &PeerId) -> Option<Participant> {
        let idx = self.members.iter().position(|p| &p.id == id)?;
        Some(self.members.remove(idx))
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

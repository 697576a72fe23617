use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a call room
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `<prefix>` followed by 9 random lowercase alphanumerics
    pub fn generate(prefix: &str) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", prefix, &suffix[..9]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room-level state machine: `Idle -> Connecting -> Connected -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    Idle,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenShareState {
    Idle,
    Sharing,
}

impl ScreenShareState {
    pub fn is_sharing(&self) -> bool {
        matches!(self, ScreenShareState::Sharing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_room_id() {
        let id = RoomId::generate("room-");
        assert!(id.as_str().starts_with("room-"));
        assert_eq!(id.as_str().len(), 14);
        assert!(id.as_str()[5..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}

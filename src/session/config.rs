use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a call session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Prefix for generated room ids (e.g., "room-" -> "room-3f9a0c21b")
    pub room_prefix: String,

    /// Rooms offered for quick join. Plain presets for `join_room`.
    pub presets: Vec<String>,

    /// How long informational notices stay visible
    pub notice_ttl: Duration,

    /// How long error notices stay visible
    pub error_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            room_prefix: "room-".to_string(),
            presets: (1..=4).map(|n| format!("room-{}", n)).collect(),
            notice_ttl: Duration::from_secs(3),
            error_ttl: Duration::from_secs(5),
        }
    }
}

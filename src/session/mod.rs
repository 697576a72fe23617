//! Call session management
//!
//! This module provides the `CallSession` abstraction that manages:
//! - Room lifecycle (create, join, leave)
//! - Local camera/microphone and screen capture
//! - Per-peer connections and room membership
//! - Transient user notices
//! - The shareable room link

mod config;
mod handle;
mod location;
mod notice;
mod participant;
mod room;
mod session;
mod snapshot;

pub use config::SessionConfig;
pub use handle::{spawn, SessionHandle};
pub use location::{Clipboard, ClipboardError, MemoryClipboard, RoomLocation, ShareableLocation};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use participant::{Participant, Roster};
pub use room::{RoomId, RoomState, ScreenShareState};
pub use session::{CallSession, LocalDisplay};
pub use snapshot::{ParticipantView, RoomSnapshot};

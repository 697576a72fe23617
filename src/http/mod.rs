//! HTTP API for hosting and driving call sessions
//!
//! This module provides a REST API over in-process call sessions:
//! - POST /sessions - Register a peer and start its session
//! - GET /sessions/:peer_id - Room, members and notices
//! - POST /sessions/:peer_id/room[/join|/leave] - Room lifecycle
//! - POST /sessions/:peer_id/toggle/{audio,video,screen} - Devices
//! - POST /sessions/:peer_id/link - Shareable room link
//! - POST /chat/:id/messages - Support chat
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{
    ChatResponse, ErrorResponse, LinkResponse, RoomResponse, ScreenShareResponse,
    SessionResponse, ToggleResponse,
};
pub use routes::create_router;
pub use state::AppState;

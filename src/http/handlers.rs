use super::state::AppState;
use crate::chat::{ChatMessage, ChatSession, SafetyRules};
use crate::error::CallError;
use crate::session::{
    self, CallSession, MemoryClipboard, RoomId, ScreenShareState, SessionHandle,
    ShareableLocation,
};
use crate::transport::{LocalTransport, PeerId, TransportError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Optional peer id (if not provided, generate one)
    #[serde(default)]
    pub peer_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub peer_id: PeerId,
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRoomRequest {
    /// Optional room id (if not provided, generate one)
    #[serde(default)]
    pub room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub room_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomResponse {
    pub room_id: Option<RoomId>,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    /// New state of the toggled device, `None` when no local media is active
    pub muted: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScreenShareResponse {
    pub screen_share: ScreenShareState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub link: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: Option<ChatMessage>,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn call_error_response(err: CallError) -> Response {
    let status = match &err {
        CallError::InvalidRoom(_) => StatusCode::BAD_REQUEST,
        CallError::MediaAccess(_) => StatusCode::FORBIDDEN,
        CallError::AlreadyInRoom(_) => StatusCode::CONFLICT,
        CallError::Connection { .. } => StatusCode::BAD_GATEWAY,
        CallError::TransportInit(_) | CallError::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
        CallError::Clipboard(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

async fn find_session(state: &AppState, peer_id: &str) -> Result<SessionHandle, Response> {
    let sessions = state.sessions.read().await;
    sessions.get(&PeerId::new(peer_id)).cloned().ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", peer_id),
        )
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /rooms/presets
/// Numbered rooms offered for quick join
pub async fn list_presets(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.call.presets.clone())
}

/// POST /sessions
/// Register a new peer on the local network and start its call session
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    let peer_id = req
        .peer_id
        .filter(|id| !id.trim().is_empty())
        .map(PeerId::new)
        .unwrap_or_else(|| PeerId::generate(&state.call.peer_prefix));

    let transport = match LocalTransport::connect(&state.network, peer_id.clone()) {
        Ok(transport) => transport,
        Err(e @ TransportError::IdTaken(_)) => {
            return error_response(StatusCode::CONFLICT, e.to_string());
        }
        Err(e) => {
            error!("Failed to initialize peer {}: {}", peer_id, e);
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Failed to initialize video call system: {}", e),
            );
        }
    };

    let location = ShareableLocation::new(&state.call.link_origin, &state.call.link_path);
    let call_session = CallSession::new(
        state.call.session_config(),
        Arc::new(transport),
        Arc::clone(&state.media),
        Box::new(location),
    );
    let (handle, _task) = session::spawn(call_session, Arc::new(MemoryClipboard::new()));

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(peer_id.clone(), handle);
    }

    info!("Session started for peer: {}", peer_id);

    (
        StatusCode::CREATED,
        Json(SessionResponse {
            peer_id,
            status: "ready".to_string(),
        }),
    )
        .into_response()
}

/// GET /sessions/:peer_id
/// Current room, members and notices of a session
pub async fn get_session(State(state): State<AppState>, Path(peer_id): Path<String>) -> Response {
    let handle = match find_session(&state, &peer_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.snapshot().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => call_error_response(e),
    }
}

/// DELETE /sessions/:peer_id
/// Leave any room and stop the session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(peer_id): Path<String>,
) -> Response {
    let handle = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&PeerId::new(peer_id.as_str()))
    };

    match handle {
        Some(handle) => {
            handle.shutdown().await;
            info!("Session stopped for peer: {}", peer_id);
            (
                StatusCode::OK,
                Json(SessionResponse {
                    peer_id: PeerId::new(peer_id),
                    status: "closed".to_string(),
                }),
            )
                .into_response()
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", peer_id),
        ),
    }
}

/// POST /sessions/:peer_id/room
/// Create a room (generated id unless one is given)
pub async fn create_room(
    State(state): State<AppState>,
    Path(peer_id): Path<String>,
    Json(req): Json<CreateRoomRequest>,
) -> Response {
    let handle = match find_session(&state, &peer_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.create_room(req.room_id.map(RoomId::new)).await {
        Ok(room_id) => (
            StatusCode::OK,
            Json(RoomResponse {
                room_id: Some(room_id),
                status: "connected".to_string(),
            }),
        )
            .into_response(),
        Err(e) => call_error_response(e),
    }
}

/// POST /sessions/:peer_id/room/join
/// Join a room by id
pub async fn join_room(
    State(state): State<AppState>,
    Path(peer_id): Path<String>,
    Json(req): Json<JoinRoomRequest>,
) -> Response {
    let handle = match find_session(&state, &peer_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.join_room(req.room_id.clone()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(RoomResponse {
                room_id: Some(RoomId::new(req.room_id.trim())),
                status: "connected".to_string(),
            }),
        )
            .into_response(),
        Err(e) => call_error_response(e),
    }
}

/// POST /sessions/:peer_id/room/leave
pub async fn leave_room(State(state): State<AppState>, Path(peer_id): Path<String>) -> Response {
    let handle = match find_session(&state, &peer_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.leave_room().await {
        Ok(()) => (
            StatusCode::OK,
            Json(RoomResponse {
                room_id: None,
                status: "idle".to_string(),
            }),
        )
            .into_response(),
        Err(e) => call_error_response(e),
    }
}

/// POST /sessions/:peer_id/toggle/audio
pub async fn toggle_audio(State(state): State<AppState>, Path(peer_id): Path<String>) -> Response {
    let handle = match find_session(&state, &peer_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.toggle_mute().await {
        Ok(muted) => (StatusCode::OK, Json(ToggleResponse { muted })).into_response(),
        Err(e) => call_error_response(e),
    }
}

/// POST /sessions/:peer_id/toggle/video
pub async fn toggle_video(State(state): State<AppState>, Path(peer_id): Path<String>) -> Response {
    let handle = match find_session(&state, &peer_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.toggle_video().await {
        Ok(muted) => (StatusCode::OK, Json(ToggleResponse { muted })).into_response(),
        Err(e) => call_error_response(e),
    }
}

/// POST /sessions/:peer_id/toggle/screen
pub async fn toggle_screen(
    State(state): State<AppState>,
    Path(peer_id): Path<String>,
) -> Response {
    let handle = match find_session(&state, &peer_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.toggle_screen_share().await {
        Ok(screen_share) => {
            (StatusCode::OK, Json(ScreenShareResponse { screen_share })).into_response()
        }
        Err(e) => call_error_response(e),
    }
}

/// POST /sessions/:peer_id/link
/// Copy the shareable room link
pub async fn copy_link(State(state): State<AppState>, Path(peer_id): Path<String>) -> Response {
    let handle = match find_session(&state, &peer_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.copy_room_link().await {
        Ok(link) => (StatusCode::OK, Json(LinkResponse { link })).into_response(),
        Err(e) => call_error_response(e),
    }
}

/// POST /chat/:conversation_id/messages
/// Send a message to the support assistant
pub async fn send_chat_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(req): Json<ChatRequestBody>,
) -> Response {
    let Some(completion) = state.completion.clone() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Chat is disabled");
    };

    let chat = {
        let mut chats = state.chats.write().await;
        Arc::clone(chats.entry(conversation_id.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(ChatSession::new(
                completion,
                SafetyRules::default(),
            )))
        }))
    };

    let mut chat = chat.lock().await;
    match chat.send(&req.content).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(ChatResponse {
                reply,
                history: chat.history().to_vec(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Chat {} failed: {}", conversation_id, e);
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// DELETE /chat/:conversation_id
/// Start the conversation over
pub async fn reset_chat(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Response {
    let chat = {
        let chats = state.chats.read().await;
        chats.get(&conversation_id).cloned()
    };

    match chat {
        Some(chat) => {
            let mut chat = chat.lock().await;
            chat.reset();
            (
                StatusCode::OK,
                Json(ChatResponse {
                    reply: None,
                    history: chat.history().to_vec(),
                }),
            )
                .into_response()
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Conversation {} not found", conversation_id),
        ),
    }
}

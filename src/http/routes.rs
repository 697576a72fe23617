use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/rooms/presets", get(handlers::list_presets))
        // Session lifecycle
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:peer_id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        // Room control
        .route("/sessions/:peer_id/room", post(handlers::create_room))
        .route("/sessions/:peer_id/room/join", post(handlers::join_room))
        .route("/sessions/:peer_id/room/leave", post(handlers::leave_room))
        .route("/sessions/:peer_id/link", post(handlers::copy_link))
        // Devices
        .route("/sessions/:peer_id/toggle/audio", post(handlers::toggle_audio))
        .route("/sessions/:peer_id/toggle/video", post(handlers::toggle_video))
        .route(
            "/sessions/:peer_id/toggle/screen",
            post(handlers::toggle_screen),
        )
        // Support chat
        .route(
            "/chat/:conversation_id/messages",
            post(handlers::send_chat_message),
        )
        .route("/chat/:conversation_id", delete(handlers::reset_chat))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// HTTP control API, exercised in-process with `tower::ServiceExt::oneshot`

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use mero_calls::chat::{ChatCompletion, ChatMessage};
use mero_calls::config::CallConfig;
use mero_calls::media::SyntheticMediaSource;
use mero_calls::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct EchoCompletion;

#[async_trait::async_trait]
impl ChatCompletion for EchoCompletion {
    async fn complete(&self, history: &[ChatMessage]) -> Result<String> {
        let last = history.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(format!("echo: {}", last))
    }
}

fn app() -> Router {
    create_router(AppState::new(
        CallConfig::default(),
        Arc::new(SyntheticMediaSource::new()),
    ))
}

fn app_with_chat() -> Router {
    let state = AppState::new(CallConfig::default(), Arc::new(SyntheticMediaSource::new()))
        .with_chat(Arc::new(EchoCompletion));
    create_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_presets() {
    let (status, body) = send(&app(), "GET", "/rooms/presets", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["room-1", "room-2", "room-3", "room-4"]));
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = app();

    let (status, body) = send(&app, "POST", "/sessions", Some(json!({"peer_id": "alice"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["peer_id"], "alice");

    let (status, _) = send(&app, "POST", "/sessions", Some(json!({"peer_id": "alice"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/sessions/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], json!("idle"));

    let (status, _) = send(&app, "DELETE", "/sessions/alice", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/sessions/alice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("alice"));
}

#[tokio::test]
async fn test_generated_peer_id() {
    let (status, body) = send(&app(), "POST", "/sessions", Some(json!({}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["peer_id"].as_str().unwrap().starts_with("user_"));
}

#[tokio::test]
async fn test_two_sessions_share_a_room() {
    let app = app();
    send(&app, "POST", "/sessions", Some(json!({"peer_id": "host"}))).await;
    send(&app, "POST", "/sessions", Some(json!({"peer_id": "guest"}))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/sessions/host/room",
        Some(json!({"room_id": "host"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room_id"], "host");

    let (status, _) = send(
        &app,
        "POST",
        "/sessions/guest/room/join",
        Some(json!({"room_id": "host"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, host) = send(&app, "GET", "/sessions/host", None).await;
    assert_eq!(host["participants"].as_array().unwrap().len(), 2);

    let (_, guest) = send(&app, "GET", "/sessions/guest", None).await;
    assert_eq!(guest["participants"].as_array().unwrap().len(), 2);
    assert_eq!(guest["link"], "http://localhost:3000/experts?room=host");

    let (status, body) = send(&app, "POST", "/sessions/guest/link", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["link"], "http://localhost:3000/experts?room=host");

    let (status, body) = send(&app, "POST", "/sessions/guest/room/leave", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "idle");

    let (_, host) = send(&app, "GET", "/sessions/host", None).await;
    assert_eq!(host["participants"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_room_errors_map_to_status() {
    let app = app();
    send(&app, "POST", "/sessions", Some(json!({"peer_id": "alice"}))).await;

    let (status, _) = send(
        &app,
        "POST",
        "/sessions/alice/room/join",
        Some(json!({"room_id": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/sessions/alice/toggle/screen", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/sessions/alice/room/join",
        Some(json!({"room_id": "nobody"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("nobody"));

    let (status, _) = send(&app, "POST", "/sessions/alice/room", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_device_toggles() {
    let app = app();
    send(&app, "POST", "/sessions", Some(json!({"peer_id": "alice"}))).await;

    let (_, body) = send(&app, "POST", "/sessions/alice/toggle/audio", None).await;
    assert_eq!(body["muted"], Value::Null);

    send(&app, "POST", "/sessions/alice/room", Some(json!({}))).await;

    let (status, body) = send(&app, "POST", "/sessions/alice/toggle/audio", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["muted"], true);

    let (_, body) = send(&app, "POST", "/sessions/alice/toggle/video", None).await;
    assert_eq!(body["muted"], true);

    let (_, body) = send(&app, "POST", "/sessions/alice/toggle/screen", None).await;
    assert_eq!(body["screen_share"], "sharing");
}

#[tokio::test]
async fn test_chat_disabled() {
    let (status, body) = send(
        &app(),
        "POST",
        "/chat/c1/messages",
        Some(json!({"content": "hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Chat is disabled");
}

#[tokio::test]
async fn test_chat_conversation() {
    let app = app_with_chat();

    let (status, body) = send(
        &app,
        "POST",
        "/chat/c1/messages",
        Some(json!({"content": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"]["content"], "echo: hello");
    assert_eq!(body["history"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, "DELETE", "/chat/c1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", "/chat/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

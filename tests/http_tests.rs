// Integration tests for the HTTP API
//
// These tests drive the router with single requests, playing the part of
// a browser client that relays signals, frames and answers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine;
use interview_proctor::http::{create_router, AppState, SessionRetention};
use interview_proctor::session::SessionConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> (AppState, Router) {
    app_with(SessionRetention::default())
}

fn app_with(retention: SessionRetention) -> (AppState, Router) {
    let state = AppState::new(SessionConfig {
        questions: vec!["Tell me about yourself.".to_string()],
        ..SessionConfig::default()
    })
    .with_retention(retention);
    (state.clone(), create_router(state))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn start(app: &Router, body: Value) -> String {
    let (status, value) = send(app, "POST", "/sessions/start", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    value["session_id"].as_str().unwrap().to_string()
}

/// Start a session with no questions; it ends as soon as it starts
async fn start_finished(app: &Router, id: &str) {
    start(
        app,
        json!({ "session_id": id, "questions": [], "speech_output": false, "media_granted": false }),
    )
    .await;

    for _ in 0..100 {
        let (status, _) = send(app, "GET", &format!("/sessions/{}/result", id), None).await;
        if status == StatusCode::OK {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("session {} never ended", id);
}

#[tokio::test]
async fn test_health_check() {
    let (_, app) = app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (_, app) = app();
    let (status, value) = send(&app, "GET", "/sessions/nope/status", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(value["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_duplicate_session_id_conflicts() {
    let (_, app) = app();
    start(&app, json!({ "session_id": "dup" })).await;

    let (status, _) = send(&app, "POST", "/sessions/start", Some(json!({ "session_id": "dup" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_text_only_session_round_trip() {
    let (_, app) = app();
    let id = start(&app, json!({ "speech_output": false, "media_granted": false })).await;

    // Wait for the floor to open for the candidate.
    let mut open = false;
    for _ in 0..50 {
        let (_, status) = send(&app, "GET", &format!("/sessions/{}/status", id), None).await;
        if status["input_enabled"] == json!(true) {
            open = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(open);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{}/answer", id),
        Some(json!({ "text": "I build distributed systems." })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, result) = send(
        &app,
        "POST",
        &format!("/sessions/{}/end", id),
        Some(json!({ "reason": "Interviewer ended the session" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["session_id"], json!(id));
    assert_eq!(result["total_questions"], json!(1));

    let (status, turns) = send(&app, "GET", &format!("/sessions/{}/turns", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(turns.as_array().unwrap().len() >= 2);

    let (status, _) = send(&app, "GET", &format!("/sessions/{}/result", id), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_restricted_key_signal_is_prevented() {
    let (_, app) = app();
    let id = start(&app, json!({ "speech_output": false })).await;

    // Give the session task a moment to install its guard.
    let mut prevented = false;
    for _ in 0..50 {
        let (status, value) = send(
            &app,
            "POST",
            &format!("/sessions/{}/signal", id),
            Some(json!({ "type": "key_down", "key": "F12" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        if value["prevent_default"] == json!(true) {
            prevented = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(prevented);
}

#[tokio::test]
async fn test_malformed_frame_is_rejected() {
    let (_, app) = app();
    let id = start(&app, json!({})).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{}/frame", id),
        Some(json!({ "width": 4, "height": 4, "rgba": "not base64!" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let short = base64::engine::general_purpose::STANDARD.encode([0u8; 8]);
    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{}/frame", id),
        Some(json!({ "width": 4, "height": 4, "rgba": short })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_result_unavailable_while_running() {
    let (_, app) = app();
    let id = start(&app, json!({})).await;

    let (status, _) = send(&app, "GET", &format!("/sessions/{}/result", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_oldest_ended_sessions_evicted_beyond_limit() {
    let (_, app) = app_with(SessionRetention {
        max_ended: 1,
        ..SessionRetention::default()
    });

    start_finished(&app, "first").await;
    start_finished(&app, "second").await;
    start(&app, json!({ "session_id": "third", "speech_output": false })).await;

    let (status, _) = send(&app, "GET", "/sessions/first/result", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/sessions/second/result", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/sessions/third/status", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_sessions_are_swept() {
    let (state, app) = app_with(SessionRetention {
        ttl: std::time::Duration::ZERO,
        ..SessionRetention::default()
    });

    start(&app, json!({ "session_id": "running", "speech_output": false })).await;
    start_finished(&app, "done").await;

    assert_eq!(state.prune_ended().await, 1);

    let (status, _) = send(&app, "GET", "/sessions/done/result", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/sessions/running/status", None).await;
    assert_eq!(status, StatusCode::OK);
}

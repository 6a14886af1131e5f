//! HTTP integration tests for the Wellspring API
//!
//! The upstream completion API is a wiremock server; requests go through the
//! full Axum router via `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wellspring_core::{
    ChatCompletionsClient, CompletionBackend, CompletionConfig, InMemorySessionStore,
    WellspringConfig, FALLBACK_REPLY,
};
use wellspring_server::http::{build_router, AppState};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request as MockRequest, ResponseTemplate};

fn completion_body(text: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

fn make_state(mock_server: &MockServer) -> Arc<AppState> {
    make_state_for(&mock_server.uri())
}

fn make_state_for(base_url: &str) -> Arc<AppState> {
    let config = WellspringConfig::default();
    let client = ChatCompletionsClient::with_base_url(
        CompletionConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(2),
        },
        base_url.to_string(),
    )
    .expect("Failed to create test client");
    let backend: Arc<dyn CompletionBackend> = Arc::new(client);
    let sessions = Arc::new(InMemorySessionStore::from_config(&config.sessions));
    Arc::new(AppState::new(config, sessions, backend))
}

async fn post_json(state: Arc<AppState>, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(state, req).await
}

async fn send(state: Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let resp = build_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Messages (minus the system prompt) the upstream saw on each call.
fn upstream_turns(requests: &[MockRequest]) -> Vec<Vec<(String, String)>> {
    requests
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            let messages = body["messages"].as_array().unwrap();
            assert_eq!(messages[0]["role"], "system", "system prompt must lead");
            messages[1..]
                .iter()
                .map(|m| {
                    (
                        m["role"].as_str().unwrap().to_string(),
                        m["content"].as_str().unwrap().to_string(),
                    )
                })
                .collect()
        })
        .collect()
}

// ===========================================================================
// TEST 1: end-to-end two-message conversation
// ===========================================================================
#[tokio::test]
async fn test_chat_conversation_end_to_end() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Check for leaks.")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let state = make_state(&mock_server);

    let (status, first) = post_json(
        state.clone(),
        "/api/chat",
        json!({ "message": "Why is my bill high?", "session_id": null }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["response"], "Check for leaks.");
    let session_id = first["session_id"].as_str().unwrap().to_string();
    assert_eq!(session_id.len(), 36);

    let (status, second) = post_json(
        state.clone(),
        "/api/chat",
        json!({ "message": "What should I do?", "session_id": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["session_id"], session_id.as_str());

    let requests = mock_server.received_requests().await.unwrap();
    let turns = upstream_turns(&requests);
    assert_eq!(
        turns[1],
        vec![
            ("user".to_string(), "Why is my bill high?".to_string()),
            ("assistant".to_string(), "Check for leaks.".to_string()),
            ("user".to_string(), "What should I do?".to_string()),
        ]
    );

    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["max_tokens"], 1024);
    assert_eq!(body["temperature"], 0.7);
}

// ===========================================================================
// TEST 2: fifteen messages never send more than ten turns
// ===========================================================================
#[tokio::test]
async fn test_history_window_bounded_over_http() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .mount(&mock_server)
        .await;

    let state = make_state(&mock_server);
    let mut session_id = Value::Null;
    for i in 1..=15 {
        let (_, body) = post_json(
            state.clone(),
            "/api/chat",
            json!({ "message": format!("question {}", i), "session_id": session_id }),
        )
        .await;
        session_id = body["session_id"].clone();
    }

    let requests = mock_server.received_requests().await.unwrap();
    let turns = upstream_turns(&requests);
    assert_eq!(turns.len(), 15);
    assert!(turns.iter().all(|t| t.len() <= 10));
    assert_eq!(turns[14].len(), 10);
    assert_eq!(
        turns[14].last().unwrap(),
        &("user".to_string(), "question 15".to_string())
    );
}

// ===========================================================================
// TEST 3: two null-session callers get distinct, separate sessions
// ===========================================================================
#[tokio::test]
async fn test_independent_sessions_do_not_mix() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hi")))
        .mount(&mock_server)
        .await;

    let state = make_state(&mock_server);
    let (_, a) = post_json(state.clone(), "/api/chat", json!({ "message": "alice here" })).await;
    let (_, b) = post_json(state.clone(), "/api/chat", json!({ "message": "bob here" })).await;
    assert_ne!(a["session_id"], b["session_id"]);

    let _ = post_json(
        state.clone(),
        "/api/chat",
        json!({ "message": "alice again", "session_id": a["session_id"] }),
    )
    .await;

    let requests = mock_server.received_requests().await.unwrap();
    let turns = upstream_turns(&requests);
    assert!(turns[2].iter().all(|(_, content)| content != "bob here"));
    assert_eq!(turns[2].len(), 3);
}

// ===========================================================================
// TEST 4: empty and missing message → 400, no upstream call, no session
// ===========================================================================
#[tokio::test]
async fn test_chat_validation_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("x")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let state = make_state(&mock_server);

    for body in [json!({ "message": "" }), json!({ "session_id": "abc" }), json!({})] {
        let (status, resp) = post_json(state.clone(), "/api/chat", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["error"], "Message is required");
    }

    assert_eq!(state.chat.session_count().await, 0);
}

// ===========================================================================
// TEST 5: malformed JSON body → 400 with error field
// ===========================================================================
#[tokio::test]
async fn test_chat_malformed_body() {
    let mock_server = MockServer::start().await;
    let state = make_state(&mock_server);

    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// ===========================================================================
// TEST 6: upstream 500 → 200 with fallback, id preserved
// ===========================================================================
#[tokio::test]
async fn test_upstream_failure_returns_fallback() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "key sk-live-123 rejected" }
        })))
        .mount(&mock_server)
        .await;

    let state = make_state(&mock_server);

    let (status, body) = post_json(
        state.clone(),
        "/api/chat",
        json!({ "message": "hello", "session_id": "existing-session" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], FALLBACK_REPLY);
    assert_eq!(body["session_id"], "existing-session");
    assert!(!body.to_string().contains("sk-live-123"));

    let (status, body) = post_json(state, "/api/chat", json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], FALLBACK_REPLY);
    assert!(!body["session_id"].as_str().unwrap().is_empty());
}

// ===========================================================================
// TEST 7: unreachable upstream → fallback
// ===========================================================================
#[tokio::test]
async fn test_unreachable_upstream_returns_fallback() {
    // Nothing listens on port 1
    let state = make_state_for("http://127.0.0.1:1");

    let (status, body) = post_json(state, "/api/chat", json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], FALLBACK_REPLY);
}

// ===========================================================================
// TEST 8: service endpoints respond
// ===========================================================================
#[tokio::test]
async fn test_service_endpoints() {
    let mock_server = MockServer::start().await;
    let state = make_state(&mock_server);

    for uri in ["/api", "/api/"] {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(state.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello World");
    }

    let req = Request::builder().uri("/api/version").body(Body::empty()).unwrap();
    let (status, body) = send(state.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["protocol"], "wellspring/1");

    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let (status, body) = send(state.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["upstream_model"], "test-model");

    let req = Request::builder().uri("/api/chatbot").body(Body::empty()).unwrap();
    let (status, body) = send(state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["quick_questions"].is_array());
}

// ===========================================================================
// TEST 9: ROI calculator over HTTP
// ===========================================================================
#[tokio::test]
async fn test_roi_endpoint() {
    let mock_server = MockServer::start().await;
    let state = make_state(&mock_server);

    let (status, body) = post_json(state.clone(), "/api/roi", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["call_deflection"], 2_160_000);
    assert_eq!(body["paper_bill_reduction"], 225_000);
    assert_eq!(body["total"], 2_385_000);

    let (status, body) = post_json(
        state,
        "/api/roi",
        json!({ "monthly_call_volume": 10_000, "avg_cost_per_call": 8 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["call_deflection"], 288_000);
}

// ===========================================================================
// TEST 10: status checks round trip
// ===========================================================================
#[tokio::test]
async fn test_status_checks() {
    let mock_server = MockServer::start().await;
    let state = make_state(&mock_server);

    let (status, created) =
        post_json(state.clone(), "/api/status", json!({ "client_name": "kiosk-1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["client_name"], "kiosk-1");

    let (status, _) = post_json(state.clone(), "/api/status", json!({ "client_name": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder().uri("/api/status").body(Body::empty()).unwrap();
    let (status, listed) = send(state, req).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
}

// ===========================================================================
// TEST 11: CORS preflight allowed for any origin by default
// ===========================================================================
#[tokio::test]
async fn test_cors_preflight() {
    let mock_server = MockServer::start().await;
    let state = make_state(&mock_server);

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .header("origin", "https://demo.example")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let resp = build_router(state).oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

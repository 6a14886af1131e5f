//! Wellspring HTTP API
//!
//! Axum-based HTTP server for the assistant demo. Every route lives under
//! `/api`.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to an
//! inner function returning `(StatusCode, serde_json::Value)`. The inner
//! functions are directly testable without axum dispatch.
//!
//! Endpoints:
//! - GET  /api/         — hello
//! - GET  /api/health   — health with session count and upstream model
//! - GET  /api/version  — server version info
//! - POST /api/chat     — chat with the assistant (session-scoped)
//! - GET  /api/chatbot  — chatbot welcome copy and quick questions
//! - POST /api/roi      — projected annual savings
//! - POST /api/status   — record a status check
//! - GET  /api/status   — list status checks

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use wellspring_core::config::HttpConfig;
use wellspring_core::{
    calculate_savings, create_backend, CompletionBackend, InMemorySessionStore, RoiInputs,
    SessionRef, WellspringConfig, WellspringError,
};

use crate::subsystems::chat::{ChatService, ChatSettings};
use crate::subsystems::status::StatusRegistry;

/// Shared state for all HTTP handlers
pub struct AppState {
    pub config: WellspringConfig,
    pub sessions: Arc<InMemorySessionStore>,
    pub chat: ChatService,
    pub status: StatusRegistry,
}

impl AppState {
    pub fn new(
        config: WellspringConfig,
        sessions: Arc<InMemorySessionStore>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        let chat = ChatService::new(sessions.clone(), backend, ChatSettings::from(&config));
        Self {
            config,
            sessions,
            chat,
            status: StatusRegistry::default(),
        }
    }

    /// Build state from config: in-memory session store plus the configured upstream.
    pub fn from_config(config: WellspringConfig) -> Result<Self, WellspringError> {
        let sessions = Arc::new(InMemorySessionStore::from_config(&config.sessions));
        let backend: Arc<dyn CompletionBackend> = Arc::from(create_backend(&config.upstream)?);
        tracing::info!(
            backend = backend.name(),
            model = backend.model(),
            "Completion backend ready"
        );
        Ok(Self::new(config, sessions, backend))
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.http);
    Router::new()
        .route("/api", get(root_handler))
        .route("/api/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/version", get(version_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/chatbot", get(chatbot_handler))
        .route("/api/roi", post(roi_handler))
        .route("/api/status", post(create_status_handler).get(list_status_handler))
        .layer(cors)
        .with_state(state)
}

/// CORS: `*` allows any origin; otherwise only the listed ones.
pub fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let origins = http.allowed_origins();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<AppState>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Wellspring HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct StatusCheckCreate {
    pub client_name: Option<String>,
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }

    fn into_value(self) -> serde_json::Value {
        serde_json::json!({ "error": self.error })
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub fn root_inner() -> serde_json::Value {
    serde_json::json!({ "message": "Hello World" })
}

pub async fn health_inner(state: &AppState) -> (StatusCode, serde_json::Value) {
    let backend = state.chat.backend();
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "sessions": state.chat.session_count().await,
            "upstream_backend": backend.name(),
            "upstream_model": backend.model(),
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "wellspring/1",
    })
}

/// Inner chat — validates, runs the chat service, maps to the wire shape.
///
/// Upstream failures still come back as 200 with the fallback text.
pub async fn chat_inner(state: &AppState, req: ChatRequest) -> (StatusCode, serde_json::Value) {
    let session = SessionRef::from_client(req.session_id);

    match state.chat.handle_chat_message(req.message, session).await {
        Ok(reply) => {
            let body = ChatResponse {
                response: reply.outcome.into_text(),
                session_id: reply.session_id,
            };
            (
                StatusCode::OK,
                serde_json::to_value(body).unwrap_or_else(|_| serde_json::json!({})),
            )
        }
        Err(e) => (StatusCode::BAD_REQUEST, ErrorResponse::new(e.to_string()).into_value()),
    }
}

pub fn chatbot_inner(config: &WellspringConfig) -> serde_json::Value {
    serde_json::json!({
        "welcome_message": config.chatbot.welcome_message,
        "quick_questions": config.chatbot.quick_questions,
        "enabled": config.chatbot.enabled,
    })
}

pub fn roi_inner(config: &WellspringConfig, inputs: RoiInputs) -> (StatusCode, serde_json::Value) {
    match calculate_savings(&inputs, &config.roi) {
        Ok(savings) => (
            StatusCode::OK,
            serde_json::to_value(savings).unwrap_or_else(|_| serde_json::json!({})),
        ),
        Err(e) => (StatusCode::BAD_REQUEST, ErrorResponse::new(e.to_string()).into_value()),
    }
}

pub async fn create_status_inner(
    state: &AppState,
    req: StatusCheckCreate,
) -> (StatusCode, serde_json::Value) {
    match state.status.record(req.client_name).await {
        Ok(check) => (
            StatusCode::OK,
            serde_json::to_value(check).unwrap_or_else(|_| serde_json::json!({})),
        ),
        Err(e) => (StatusCode::BAD_REQUEST, ErrorResponse::new(e.to_string()).into_value()),
    }
}

pub async fn list_status_inner(state: &AppState) -> (StatusCode, serde_json::Value) {
    let checks = state.status.list().await;
    (
        StatusCode::OK,
        serde_json::to_value(checks).unwrap_or_else(|_| serde_json::json!([])),
    )
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(root_inner()))
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match payload {
        Ok(Json(req)) => chat_inner(&state, req).await,
        Err(rejection) => rejection_response(rejection),
    };
    (status, Json(body))
}

pub async fn chatbot_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(chatbot_inner(&state.config)))
}

pub async fn roi_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RoiInputs>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match payload {
        Ok(Json(inputs)) => roi_inner(&state.config, inputs),
        Err(rejection) => rejection_response(rejection),
    };
    (status, Json(body))
}

pub async fn create_status_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StatusCheckCreate>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match payload {
        Ok(Json(req)) => create_status_inner(&state, req).await,
        Err(rejection) => rejection_response(rejection),
    };
    (status, Json(body))
}

pub async fn list_status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, body) = list_status_inner(&state).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

/// Malformed or non-JSON bodies become a 400 with the usual `{error}` shape.
pub fn rejection_response(rejection: JsonRejection) -> (StatusCode, serde_json::Value) {
    tracing::debug!(error = %rejection.body_text(), "Rejected request body");
    (
        StatusCode::BAD_REQUEST,
        ErrorResponse::new("Invalid request body").into_value(),
    )
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================

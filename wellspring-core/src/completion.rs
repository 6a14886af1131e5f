//! Upstream completion module — OpenAI-compatible chat completions
//!
//! Provides a `CompletionBackend` trait with implementations for:
//! - **ChatCompletionsClient** — HTTPS POST to `{base_url}/chat/completions`
//!   with bearer authentication
//! - **UnavailableBackend** — stands in when no API key is configured; every
//!   call fails so the chat layer answers with its fallback text
//!
//! A single attempt is made per call. Callers own any fallback policy.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::models::Turn;

// ============================================================================
// CompletionBackend trait
// ============================================================================

/// One completion request: a system instruction, the rolling turn window and
/// the sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub turns: Vec<Turn>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Abstraction over completion providers.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate one assistant reply for the request.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError>;

    /// Model identifier sent upstream.
    fn model(&self) -> &str;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing completion content in response")]
    MissingContent,

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        match self {
            UpstreamError::Http(e) => e.is_timeout(),
            UpstreamError::Timeout(_) => true,
            _ => false,
        }
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl CompletionConfig {
    pub fn from_upstream(upstream: &UpstreamConfig, api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.or_else(|| upstream.api_key()).unwrap_or_default(),
            model: upstream.model.clone(),
            timeout: Duration::from_secs(upstream.timeout_seconds),
        }
    }
}

/// Create the completion backend for the configured upstream.
///
/// Falls back to `UnavailableBackend` (with a warning) when the API key is
/// missing, so the service still starts and serves fallback replies.
pub fn create_backend(upstream: &UpstreamConfig) -> Result<Box<dyn CompletionBackend>, UpstreamError> {
    let config = CompletionConfig::from_upstream(upstream, None);
    match ChatCompletionsClient::with_base_url(config, upstream.base_url.clone()) {
        Ok(client) => Ok(Box::new(client)),
        Err(UpstreamError::MissingApiKey) => {
            tracing::warn!(
                env = %upstream.api_key_env,
                "No upstream API key set, chat will answer with the fallback message"
            );
            Ok(Box::new(UnavailableBackend {
                model: upstream.model.clone(),
            }))
        }
        Err(e) => Err(e),
    }
}

// ============================================================================
// Wire structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: Option<WireChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireErrorResponse {
    error: Option<WireErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    message: String,
}

// ============================================================================
// ChatCompletionsClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    config: CompletionConfig,
    base_url: String,
}

impl ChatCompletionsClient {
    pub fn with_base_url(config: CompletionConfig, base_url: String) -> Result<Self, UpstreamError> {
        if config.api_key.is_empty() {
            return Err(UpstreamError::MissingApiKey);
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn complete_once(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(request.turns.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: &request.system,
        });
        messages.extend(request.turns.iter().map(|t| WireMessage {
            role: t.role.as_str(),
            content: &t.content,
        }));

        let body = WireRequest {
            model: &self.config.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<WireErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Completion API error");

            return Err(UpstreamError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let parsed: WireResponse = response.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(UpstreamError::MissingContent)
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionsClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        self.complete_once(request).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}

// ============================================================================
// UnavailableBackend
// ============================================================================

#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    model: String,
}

#[async_trait]
impl CompletionBackend for UnavailableBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, UpstreamError> {
        Err(UpstreamError::MissingApiKey)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

// ============================================================================
// TESTS
// ============================================================================

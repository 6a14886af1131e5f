//! Chat subsystem — session-scoped proxy to the upstream completion API
//!
//! Each message:
//! 1. resolves the session (minting an id for new sessions)
//! 2. appends the user turn and trims history to the rolling window
//! 3. sends system prompt + window upstream, once, bounded by a timeout
//! 4. on success appends the assistant turn; on failure answers with the
//!    fixed fallback text and logs the cause
//!
//! Requests for the same session are serialized; different sessions run
//! concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use wellspring_core::{
    CompletionBackend, CompletionRequest, SessionRef, SessionStore, Turn, UpstreamError,
    WellspringConfig, FALLBACK_REPLY, SYSTEM_PROMPT,
};

#[derive(Error, Debug, PartialEq)]
pub enum ChatError {
    #[error("Message is required")]
    MissingMessage,
}

/// What the caller gets back, tagged by whether the upstream actually answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Answered(String),
    Degraded(String),
}

impl Outcome {
    pub fn text(&self) -> &str {
        match self {
            Outcome::Answered(t) | Outcome::Degraded(t) => t,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Outcome::Answered(t) | Outcome::Degraded(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub session_id: String,
    pub outcome: Outcome,
}

/// Sampling and windowing parameters, fixed for the lifetime of the service.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub history_window: usize,
    pub max_tokens: u32,
    pub temperature: f64,
    pub upstream_timeout: Duration,
}

impl From<&WellspringConfig> for ChatSettings {
    fn from(config: &WellspringConfig) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            history_window: config.sessions.history_window.max(1),
            max_tokens: config.upstream.max_tokens,
            temperature: config.upstream.temperature,
            upstream_timeout: Duration::from_secs(config.upstream.timeout_seconds),
        }
    }
}

/// Per-session async locks. Entries are weak so idle sessions cost nothing.
#[derive(Default)]
struct SessionLocks {
    inner: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, weak| weak.strong_count() > 0);
            match locks.get(session_id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(session_id.to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }
}

pub struct ChatService {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn CompletionBackend>,
    settings: ChatSettings,
    locks: SessionLocks,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn CompletionBackend>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            store,
            backend,
            settings,
            locks: SessionLocks::default(),
        }
    }

    pub fn backend(&self) -> &dyn CompletionBackend {
        self.backend.as_ref()
    }

    pub async fn session_count(&self) -> usize {
        self.store.len().await
    }

    /// Handle one chat message. Only a missing/blank message is an error;
    /// upstream failures come back as `Outcome::Degraded`.
    pub async fn handle_chat_message(
        &self,
        message: Option<String>,
        session: SessionRef,
    ) -> Result<ChatReply, ChatError> {
        let message = match message {
            Some(m) if !m.trim().is_empty() => m,
            _ => return Err(ChatError::MissingMessage),
        };

        let is_new = session == SessionRef::New;
        let session_id = session.into_id();
        let _guard = self.locks.acquire(&session_id).await;

        self.store.append(&session_id, Turn::user(message)).await;
        self.store
            .trim(&session_id, self.settings.history_window)
            .await;
        let window = self.store.history(&session_id).await;

        tracing::debug!(
            session_id = %session_id,
            new_session = is_new,
            turns = window.len(),
            "Forwarding chat window upstream"
        );

        let request = CompletionRequest {
            system: self.settings.system_prompt.clone(),
            turns: window,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let outcome = match self.call_upstream(&request).await {
            Ok(text) => {
                self.store
                    .append(&session_id, Turn::assistant(text.clone()))
                    .await;
                self.store
                    .trim(&session_id, self.settings.history_window)
                    .await;
                tracing::info!(session_id = %session_id, outcome = "answered", "Chat response generated");
                Outcome::Answered(text)
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    outcome = "degraded",
                    backend = self.backend.name(),
                    timeout = e.is_timeout(),
                    error = %e,
                    "Upstream completion failed, answering with fallback"
                );
                Outcome::Degraded(FALLBACK_REPLY.to_string())
            }
        };

        Ok(ChatReply {
            session_id,
            outcome,
        })
    }

    async fn call_upstream(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        let timeout = self.settings.upstream_timeout;
        match tokio::time::timeout(timeout, self.backend.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(timeout)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

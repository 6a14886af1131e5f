//! Session store — per-session conversation history
//!
//! `SessionStore` is the seam between the chat service and wherever turns
//! live. `InMemorySessionStore` keeps them in process memory, bounded by an
//! LRU cap on the number of sessions and an optional idle TTL.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;

use crate::config::SessionConfig;
use crate::models::Turn;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Turns for a session in insertion order. Unknown or expired sessions
    /// yield an empty history.
    async fn history(&self, session_id: &str) -> Vec<Turn>;

    /// Append one turn, creating the session if it does not exist.
    async fn append(&self, session_id: &str, turn: Turn);

    /// Drop the oldest turns so at most `max_turns` remain.
    async fn trim(&self, session_id: &str, max_turns: usize);

    /// Number of sessions currently held.
    async fn len(&self) -> usize;
}

struct SessionEntry {
    turns: Vec<Turn>,
    last_active: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            turns: Vec::new(),
            last_active: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.last_active.elapsed() > ttl)
    }
}

pub struct InMemorySessionStore {
    sessions: Mutex<LruCache<String, SessionEntry>>,
    idle_ttl: Option<Duration>,
}

impl InMemorySessionStore {
    /// `max_sessions == 0` means unbounded; `idle_ttl == None` disables expiry.
    pub fn new(max_sessions: usize, idle_ttl: Option<Duration>) -> Self {
        let cache = match NonZeroUsize::new(max_sessions) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self {
            sessions: Mutex::new(cache),
            idle_ttl,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        let ttl = (config.idle_ttl_minutes > 0)
            .then(|| Duration::from_secs(config.idle_ttl_minutes * 60));
        Self::new(config.max_sessions, ttl)
    }

    /// Remove every session idle for longer than the TTL. Returns how many were dropped.
    pub async fn prune_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.idle_ttl))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            sessions.pop(id);
        }
        expired.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn history(&self, session_id: &str) -> Vec<Turn> {
        let mut sessions = self.sessions.lock().await;
        let expired = match sessions.peek(session_id) {
            Some(entry) => entry.is_expired(self.idle_ttl),
            None => return Vec::new(),
        };
        if expired {
            sessions.pop(session_id);
            tracing::debug!(session_id, "Session expired, starting fresh history");
            return Vec::new();
        }
        sessions
            .get(session_id)
            .map(|entry| entry.turns.clone())
            .unwrap_or_default()
    }

    async fn append(&self, session_id: &str, turn: Turn) {
        let mut sessions = self.sessions.lock().await;
        let ttl = self.idle_ttl;
        match sessions.get_mut(session_id) {
            Some(entry) => {
                if entry.is_expired(ttl) {
                    entry.turns.clear();
                }
                entry.turns.push(turn);
                entry.last_active = Instant::now();
            }
            None => {
                let mut entry = SessionEntry::new();
                entry.turns.push(turn);
                if let Some((evicted, _)) = sessions.push(session_id.to_string(), entry) {
                    if evicted != session_id {
                        tracing::debug!(evicted = %evicted, "Session evicted (capacity reached)");
                    }
                }
            }
        }
    }

    async fn trim(&self, session_id: &str, max_turns: usize) {
        let mut sessions = self.sessions.lock().await;
        if let Some(entry) = sessions.get_mut(session_id) {
            let excess = entry.turns.len().saturating_sub(max_turns);
            if excess > 0 {
                entry.turns.drain(..excess);
            }
        }
    }

    async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn. The system instruction is never stored as a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A session identifier as received from a client, resolved once at the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRef {
    New,
    Existing(String),
}

impl SessionRef {
    /// Absent and blank identifiers both mean "start a new session".
    pub fn from_client(session_id: Option<String>) -> Self {
        match session_id {
            Some(id) if !id.trim().is_empty() => SessionRef::Existing(id),
            _ => SessionRef::New,
        }
    }

    /// The concrete id to key history by, minting a UUID v4 for new sessions.
    pub fn into_id(self) -> String {
        match self {
            SessionRef::New => Uuid::new_v4().to_string(),
            SessionRef::Existing(id) => id,
        }
    }
}

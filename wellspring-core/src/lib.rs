pub mod completion;
pub mod config;
pub mod error;
pub mod models;
pub mod prompt;
pub mod roi;
pub mod store;

pub use completion::{
    create_backend, ChatCompletionsClient, CompletionBackend, CompletionConfig, CompletionRequest,
    UnavailableBackend, UpstreamError,
};
pub use config::WellspringConfig;
pub use error::WellspringError;
pub use models::{Role, SessionRef, StatusCheck, Turn};
pub use prompt::{FALLBACK_REPLY, SYSTEM_PROMPT};
pub use roi::{calculate_savings, RoiError, RoiInputs, RoiSavings};
pub use store::{InMemorySessionStore, SessionStore};

//! Status-check registry — clients record a ping by name; the list is readable back.

use thiserror::Error;
use tokio::sync::RwLock;
use wellspring_core::StatusCheck;

/// Listing cap, matching the page size the dashboard reads.
pub const MAX_LISTED: usize = 1000;

#[derive(Error, Debug, PartialEq)]
pub enum StatusError {
    #[error("client_name is required")]
    MissingClientName,
}

#[derive(Default)]
pub struct StatusRegistry {
    checks: RwLock<Vec<StatusCheck>>,
}

impl StatusRegistry {
    pub async fn record(&self, client_name: Option<String>) -> Result<StatusCheck, StatusError> {
        let client_name = match client_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(StatusError::MissingClientName),
        };
        let check = StatusCheck::new(client_name);
        self.checks.write().await.push(check.clone());
        tracing::debug!(id = %check.id, client = %check.client_name, "Status check recorded");
        Ok(check)
    }

    /// Oldest first, at most `MAX_LISTED`.
    pub async fn list(&self) -> Vec<StatusCheck> {
        self.checks
            .read()
            .await
            .iter()
            .take(MAX_LISTED)
            .cloned()
            .collect()
    }
}

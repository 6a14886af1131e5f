//! Session sweeper — periodically drops sessions idle past the TTL.
//!
//! Expired sessions are also dropped lazily on access; the sweep bounds
//! memory held by sessions nobody comes back to.

use std::sync::Arc;

use tokio::sync::broadcast;
use wellspring_core::InMemorySessionStore;

pub async fn run_session_sweeper(
    store: Arc<InMemorySessionStore>,
    interval: tokio::time::Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!("Session sweeper started (interval: {}s)", interval.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.prune_expired().await;
                if removed > 0 {
                    tracing::info!(removed, "Pruned idle sessions");
                } else {
                    tracing::debug!("Session sweep: nothing to prune");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Session sweeper shutting down");
                break;
            }
        }
    }
}

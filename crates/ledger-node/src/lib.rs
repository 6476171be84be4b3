pub mod api;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod fetcher;

use context::AppState;
use std::time::Duration;
use tracing::{debug, info};

/// Periodically reconcile with peers until the process exits.
pub async fn resolve_periodically(state: AppState, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately; skip it so startup does not race peers.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if state.resolve_conflicts().await {
            info!(length = state.ledger.len(), "background consensus replaced the chain");
        } else {
            debug!("background consensus kept the local chain");
        }
    }
}

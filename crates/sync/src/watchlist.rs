use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use watchsync_core::{MediaId, Result, WatchedItem};
use watchsync_gateway::SyncGateway;
use watchsync_store::SyncStore;

/// Adds to and removes from the watchlist of one media kind.
///
/// The remote call always goes first. The cache is written only after it
/// succeeds, so a failed or dropped call leaves the cache as it was. A
/// watchlist that was never hydrated is not written at all; the next read
/// fetches it whole, mutation included.
pub struct ChangeWatchlist<R> {
    store: Arc<SyncStore<R>>,
    gateway: Arc<dyn SyncGateway>,
}

impl<R: WatchedItem> ChangeWatchlist<R> {
    pub fn new(store: Arc<SyncStore<R>>, gateway: Arc<dyn SyncGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn add(&self, id: MediaId) -> Result<()> {
        let kind = self.store.kind();
        self.gateway
            .add_to_watchlist(kind, id)
            .await
            .inspect_err(|e| {
                warn!(kind = %kind, %id, error = %e, "add to watchlist failed");
            })?;

        let cached = self.store.merge_watchlist([id], Utc::now()).await;
        info!(kind = %kind, %id, cached, "added to watchlist");
        Ok(())
    }

    pub async fn remove(&self, id: MediaId) -> Result<()> {
        let kind = self.store.kind();
        self.gateway
            .remove_from_watchlist(kind, id)
            .await
            .inspect_err(|e| {
                warn!(kind = %kind, %id, error = %e, "remove from watchlist failed");
            })?;

        let cached = self.store.remove_watchlist([id], Utc::now()).await;
        info!(kind = %kind, %id, cached, "removed from watchlist");
        Ok(())
    }
}

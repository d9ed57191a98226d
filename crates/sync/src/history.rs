use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use watchsync_core::{MediaId, MediaKind, Result, WatchedItem};
use watchsync_gateway::{HistoryAddedDto, SyncGateway};
use watchsync_store::SyncStore;

/// Records and retracts plays for one media kind.
///
/// Marking something watched also takes it off the watchlist of the same
/// kind. The two caches are locked separately, so for a moment a reader can
/// see the item both watched and still listed.
pub struct ChangeHistory<R> {
    store: Arc<SyncStore<R>>,
    gateway: Arc<dyn SyncGateway>,
}

impl<R: WatchedItem> ChangeHistory<R> {
    pub fn new(store: Arc<SyncStore<R>>, gateway: Arc<dyn SyncGateway>) -> Self {
        Self { store, gateway }
    }

    /// Records a play at `watched_at` and returns how many plays were added.
    ///
    /// The cached record, if the watched cache is hydrated, is replaced by one
    /// with the added plays and `last_watched_at` set to now.
    pub async fn add(&self, id: MediaId, watched_at: DateTime<Utc>) -> Result<u32> {
        let kind = self.store.kind();
        let response = self
            .gateway
            .add_to_history(kind, id, watched_at)
            .await
            .inspect_err(|e| {
                warn!(kind = %kind, %id, error = %e, "add to history failed");
            })?;

        let added = added_plays(kind, response);
        let now = Utc::now();

        let record = self.store.replay_watched(id, added, now).await;
        self.store.remove_watchlist([id], now).await;

        info!(
            kind = %kind,
            %id,
            added,
            plays = record.as_ref().map(|r| r.plays()),
            "added to history"
        );
        Ok(added)
    }

    /// Removes every play of `id` from the remote history and the cache.
    pub async fn remove(&self, id: MediaId) -> Result<()> {
        let kind = self.store.kind();
        self.gateway
            .remove_from_history(kind, id)
            .await
            .inspect_err(|e| {
                warn!(kind = %kind, %id, error = %e, "remove from history failed");
            })?;

        let cached = self.store.remove_watched([id], Utc::now()).await;
        info!(kind = %kind, %id, cached, "removed from history");
        Ok(())
    }
}

/// A show is marked watched as a whole, so its count comes from the remote.
/// A movie or an episode gains the remote's count, and never less than one
/// play after a successful write.
fn added_plays(kind: MediaKind, response: HistoryAddedDto) -> u32 {
    match kind {
        MediaKind::Show => response.episodes,
        MediaKind::Movie => response.movies.max(1),
        MediaKind::Episode => response.episodes.max(1),
        MediaKind::Person => 0,
    }
}

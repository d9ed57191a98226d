use std::sync::Arc;

use chrono::{DateTime, Utc};
use watchsync_core::{Collection, WatchedItem};
use watchsync_store::SyncStore;

/// Tells a screen whether the data it loaded has since been overtaken by a
/// local write, so it can refetch quietly instead of showing a spinner.
pub struct SyncStatus<R> {
    store: Arc<SyncStore<R>>,
}

impl<R: WatchedItem> SyncStatus<R> {
    pub fn new(store: Arc<SyncStore<R>>) -> Self {
        Self { store }
    }

    /// True iff `loaded_at` is set and strictly older than the collection's
    /// last write.
    pub async fn is_sync_required(
        &self,
        collection: Collection,
        loaded_at: Option<DateTime<Utc>>,
    ) -> bool {
        let Some(loaded_at) = loaded_at else {
            return false;
        };
        match self.store.updated_at(collection).await {
            Some(updated_at) => loaded_at < updated_at,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use watchsync_core::{MediaId, MediaKind, WatchRecord};

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn newer_write_requires_sync() {
        let store = Arc::new(SyncStore::new(MediaKind::Movie));
        let status = SyncStatus::new(store.clone());
        store
            .save_watched(
                [WatchRecord {
                    id: MediaId(1),
                    plays: 1,
                    last_watched_at: t(5),
                }],
                t(5),
            )
            .await;

        assert!(status.is_sync_required(Collection::Watched, Some(t(0))).await);
        assert!(!status.is_sync_required(Collection::Watched, Some(t(5))).await);
        assert!(!status.is_sync_required(Collection::Watched, Some(t(9))).await);
        assert!(!status.is_sync_required(Collection::Watched, None).await);
    }

    #[tokio::test]
    async fn never_written_collection_needs_no_sync() {
        let store: Arc<SyncStore<WatchRecord>> = Arc::new(SyncStore::new(MediaKind::Episode));
        let status = SyncStatus::new(store);
        assert!(!status.is_sync_required(Collection::Watchlist, Some(t(0))).await);
    }
}

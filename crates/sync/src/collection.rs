//! Reads of watchlist and watched state, hydrating lazily from the remote.
//!
//! A cold collection is fetched whole, once, and every later lookup is served
//! from memory. Two callers that race on a cold collection may both fetch;
//! the second write replaces the first with equivalent data.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use watchsync_core::{MediaId, Result, WatchedItem};
use watchsync_gateway::{SyncGateway, WatchedDto};
use watchsync_store::{Lookup, SyncStore};

use crate::config::SyncConfig;

/// Upper bound on watchlist pages fetched during one hydration.
const MAX_WATCHLIST_PAGES: u32 = 100;

pub struct CollectionState<R> {
    store: Arc<SyncStore<R>>,
    gateway: Arc<dyn SyncGateway>,
    config: Arc<SyncConfig>,
}

impl<R> CollectionState<R>
where
    R: WatchedItem + From<WatchedDto>,
{
    pub fn new(
        store: Arc<SyncStore<R>>,
        gateway: Arc<dyn SyncGateway>,
        config: Arc<SyncConfig>,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    /// Watched record for `id`, or `None` if it has never been watched.
    pub async fn watched_record(&self, id: MediaId) -> Result<Option<R>> {
        match self.store.watched_lookup(id).await {
            Lookup::Found(record) => Ok(Some(record)),
            Lookup::Missing => Ok(None),
            Lookup::NotLoaded => {
                let watched = self.hydrate_watched().await?;
                Ok(watched.get(&id).cloned())
            }
        }
    }

    pub async fn is_watchlisted(&self, id: MediaId) -> Result<bool> {
        match self.store.watchlist_lookup(id).await {
            Lookup::Found(_) => Ok(true),
            Lookup::Missing => Ok(false),
            Lookup::NotLoaded => {
                let watchlist = self.hydrate_watchlist().await?;
                Ok(watchlist.contains(&id))
            }
        }
    }

    /// The whole watched collection.
    pub async fn watched(&self) -> Result<HashMap<MediaId, R>> {
        match self.store.watched().await {
            Some(watched) => Ok(watched),
            None => self.hydrate_watched().await,
        }
    }

    /// The whole watchlist.
    pub async fn watchlist(&self) -> Result<HashSet<MediaId>> {
        match self.store.watchlist().await {
            Some(watchlist) => Ok(watchlist),
            None => self.hydrate_watchlist().await,
        }
    }

    async fn hydrate_watched(&self) -> Result<HashMap<MediaId, R>> {
        let kind = self.store.kind();
        debug!(kind = %kind, "watched cache cold, fetching from remote");

        let dtos = self.gateway.get_watched(kind).await.inspect_err(|e| {
            warn!(kind = %kind, error = %e, "failed to fetch watched collection");
        })?;
        let records: Vec<R> = dtos.into_iter().map(R::from).collect();
        self.store.hydrate_watched(records.clone(), Utc::now()).await;

        Ok(records.into_iter().map(|r| (r.id(), r)).collect())
    }

    async fn hydrate_watchlist(&self) -> Result<HashSet<MediaId>> {
        let kind = self.store.kind();
        let limit = self.config.watchlist_page_limit;
        debug!(kind = %kind, "watchlist cache cold, fetching from remote");

        let mut ids = HashSet::new();
        for page in 1..=MAX_WATCHLIST_PAGES {
            let entries = self
                .gateway
                .get_watchlist(kind, self.config.watchlist_sort, Some(page), Some(limit))
                .await
                .inspect_err(|e| {
                    warn!(kind = %kind, page, error = %e, "failed to fetch watchlist page");
                })?;
            let fetched = entries.len();
            ids.extend(entries.into_iter().map(|e| e.id));
            if fetched < limit as usize {
                break;
            }
            if page == MAX_WATCHLIST_PAGES {
                warn!(kind = %kind, pages = page, "watchlist paging stopped at page cap");
            }
        }

        info!(kind = %kind, count = ids.len(), "watchlist fetched");
        self.store.hydrate_watchlist(ids.clone(), Utc::now()).await;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use watchsync_core::{MediaKind, WatchRecord};
    use watchsync_gateway::{InMemoryGateway, WatchlistEntryDto};

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, hour, 0, 0).unwrap()
    }

    fn listed(ids: impl IntoIterator<Item = u64>) -> Vec<WatchlistEntryDto> {
        ids.into_iter()
            .map(|id| WatchlistEntryDto {
                id: MediaId(id),
                listed_at: ts(1),
            })
            .collect()
    }

    fn state_with(
        gateway: Arc<InMemoryGateway>,
        config: SyncConfig,
    ) -> (CollectionState<WatchRecord>, Arc<SyncStore<WatchRecord>>) {
        let store = Arc::new(SyncStore::new(MediaKind::Movie));
        let state = CollectionState::new(store.clone(), gateway, Arc::new(config));
        (state, store)
    }

    #[tokio::test]
    async fn watchlist_is_paged_until_a_short_page() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.seed_watchlist(MediaKind::Movie, listed(1..=5)).await;
        let config = SyncConfig {
            watchlist_page_limit: 2,
            ..SyncConfig::default()
        };
        let (state, _) = state_with(gateway.clone(), config);

        let watchlist = state.watchlist().await.unwrap();
        assert_eq!(watchlist.len(), 5);
        assert_eq!(gateway.calls("get_watchlist").await, 3);
    }

    #[tokio::test]
    async fn exact_multiple_of_page_size_costs_one_empty_page() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.seed_watchlist(MediaKind::Movie, listed(1..=4)).await;
        let config = SyncConfig {
            watchlist_page_limit: 2,
            ..SyncConfig::default()
        };
        let (state, _) = state_with(gateway.clone(), config);

        assert!(state.is_watchlisted(MediaId(4)).await.unwrap());
        assert_eq!(gateway.calls("get_watchlist").await, 3);
    }

    #[tokio::test]
    async fn empty_remote_collection_is_still_hydrated_once() {
        let gateway = Arc::new(InMemoryGateway::new());
        let (state, store) = state_with(gateway.clone(), SyncConfig::default());

        assert_eq!(state.watched_record(MediaId(1)).await.unwrap(), None);
        assert_eq!(state.watched_record(MediaId(2)).await.unwrap(), None);
        assert_eq!(gateway.calls("get_watched").await, 1);
        assert!(store.watched_updated_at().await.is_some());
    }
}

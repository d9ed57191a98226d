use std::sync::Arc;

use tracing::info;
use watchsync_core::{ShowWatchRecord, WatchRecord, WatchedItem};
use watchsync_gateway::{SyncGateway, WatchedDto};
use watchsync_store::{SyncStore, SyncStores};

use crate::calendar::{Calendar, CalendarPolicy};
use crate::collection::CollectionState;
use crate::config::SyncConfig;
use crate::history::ChangeHistory;
use crate::history_feed::HistoryFeed;
use crate::status::SyncStatus;
use crate::up_next::UpNext;
use crate::watchlist::ChangeWatchlist;

/// Everything sync-related for one signed-in user.
///
/// Create one at sign-in and call [`logout`](Self::logout) at sign-out. The
/// stores live exactly as long as the session; nothing here is global.
pub struct SyncSession {
    stores: SyncStores,
    gateway: Arc<dyn SyncGateway>,
    config: Arc<SyncConfig>,
}

impl SyncSession {
    pub fn new(gateway: Arc<dyn SyncGateway>, config: SyncConfig) -> Self {
        info!(gateway = gateway.name(), "sync session started");
        Self {
            stores: SyncStores::new(),
            gateway,
            config: Arc::new(config),
        }
    }

    pub fn stores(&self) -> &SyncStores {
        &self.stores
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn shows(&self) -> MediaSync<ShowWatchRecord> {
        self.media(self.stores.shows.clone())
    }

    pub fn movies(&self) -> MediaSync<WatchRecord> {
        self.media(self.stores.movies.clone())
    }

    pub fn episodes(&self) -> MediaSync<WatchRecord> {
        self.media(self.stores.episodes.clone())
    }

    pub fn up_next(&self) -> UpNext {
        UpNext::new(
            self.stores.up_next.clone(),
            self.gateway.clone(),
            self.config.clone(),
        )
    }

    pub fn calendar(&self, policy: CalendarPolicy) -> Calendar {
        Calendar::new(self.gateway.clone(), self.config.clone(), policy)
    }

    pub fn history_feed(&self) -> HistoryFeed {
        HistoryFeed::new(self.gateway.clone(), self.config.clone())
    }

    /// Drops every cached collection. Later reads behave as never hydrated.
    pub async fn logout(&self) {
        self.stores.clear().await;
        info!("sync session logged out");
    }

    fn media<R>(&self, store: Arc<SyncStore<R>>) -> MediaSync<R> {
        MediaSync {
            store,
            gateway: self.gateway.clone(),
            config: self.config.clone(),
        }
    }
}

/// Use cases bound to one media kind's store.
pub struct MediaSync<R> {
    store: Arc<SyncStore<R>>,
    gateway: Arc<dyn SyncGateway>,
    config: Arc<SyncConfig>,
}

impl<R> MediaSync<R>
where
    R: WatchedItem + From<WatchedDto>,
{
    pub fn store(&self) -> &Arc<SyncStore<R>> {
        &self.store
    }

    pub fn collection(&self) -> CollectionState<R> {
        CollectionState::new(self.store.clone(), self.gateway.clone(), self.config.clone())
    }

    pub fn watchlist(&self) -> ChangeWatchlist<R> {
        ChangeWatchlist::new(self.store.clone(), self.gateway.clone())
    }

    pub fn history(&self) -> ChangeHistory<R> {
        ChangeHistory::new(self.store.clone(), self.gateway.clone())
    }

    pub fn status(&self) -> SyncStatus<R> {
        SyncStatus::new(self.store.clone())
    }
}

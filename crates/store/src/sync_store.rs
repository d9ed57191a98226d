use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use watchsync_core::feed::ProgressShow;
use watchsync_core::{Collection, MediaId, MediaKind, ShowWatchRecord, WatchRecord, WatchedItem};

use crate::timestamped::{Lookup, TimestampedMap, TimestampedSet, TimestampedSnapshot};

/// Watchlist membership and watched state for one media kind.
///
/// The two collections have independent locks. A reader that looks at both
/// while a "mark watched" is in flight can briefly see an item as watched and
/// still on the watchlist.
#[derive(Debug)]
pub struct SyncStore<R> {
    kind: MediaKind,
    watchlist: TimestampedSet<MediaId>,
    watched: TimestampedMap<MediaId, R>,
}

pub type ShowStore = SyncStore<ShowWatchRecord>;
pub type MovieStore = SyncStore<WatchRecord>;
pub type EpisodeStore = SyncStore<WatchRecord>;

impl<R: WatchedItem> SyncStore<R> {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            watchlist: TimestampedSet::new(),
            watched: TimestampedMap::new(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub async fn watchlist(&self) -> Option<HashSet<MediaId>> {
        self.watchlist.get().await
    }

    pub async fn watchlist_lookup(&self, id: MediaId) -> Lookup<MediaId> {
        self.watchlist.lookup(&id).await
    }

    pub async fn save_watchlist(&self, ids: impl IntoIterator<Item = MediaId>, at: DateTime<Utc>) {
        let ids: Vec<MediaId> = ids.into_iter().collect();
        debug!(kind = %self.kind, count = ids.len(), "saving watchlist");
        self.watchlist.save(ids, at).await;
    }

    /// Replaces the watchlist with a freshly fetched one, even if empty.
    pub async fn hydrate_watchlist(&self, ids: HashSet<MediaId>, at: DateTime<Utc>) {
        info!(kind = %self.kind, count = ids.len(), "watchlist hydrated");
        self.watchlist.set(ids, at).await;
    }

    /// Adds to an already hydrated watchlist; a cold one is left for the next
    /// hydration to fill.
    pub async fn merge_watchlist(
        &self,
        ids: impl IntoIterator<Item = MediaId>,
        at: DateTime<Utc>,
    ) -> bool {
        self.watchlist.merge_loaded(ids, at).await
    }

    pub async fn remove_watchlist(
        &self,
        ids: impl IntoIterator<Item = MediaId>,
        at: DateTime<Utc>,
    ) -> bool {
        self.watchlist.remove(ids, at).await
    }

    pub async fn watchlist_updated_at(&self) -> Option<DateTime<Utc>> {
        self.watchlist.updated_at().await
    }

    pub async fn watched(&self) -> Option<HashMap<MediaId, R>> {
        self.watched.get().await
    }

    pub async fn watched_lookup(&self, id: MediaId) -> Lookup<R> {
        self.watched.lookup(&id).await
    }

    pub async fn save_watched(&self, records: impl IntoIterator<Item = R>, at: DateTime<Utc>) {
        let entries: Vec<(MediaId, R)> = records.into_iter().map(|r| (r.id(), r)).collect();
        debug!(kind = %self.kind, count = entries.len(), "saving watched");
        self.watched.save(entries, at).await;
    }

    /// Replaces the watched map with a freshly fetched one, even if empty.
    pub async fn hydrate_watched(&self, records: impl IntoIterator<Item = R>, at: DateTime<Utc>) {
        let map: HashMap<MediaId, R> = records.into_iter().map(|r| (r.id(), r)).collect();
        info!(kind = %self.kind, count = map.len(), "watched hydrated");
        self.watched.set(map, at).await;
    }

    /// Replaces the record for `id` with `R::replay(previous, ..)` under one
    /// lock, so concurrent plays of the same item are not lost. Returns the
    /// new record, or `None` if the watched cache is cold.
    pub async fn replay_watched(&self, id: MediaId, added: u32, at: DateTime<Utc>) -> Option<R> {
        self.watched
            .update_loaded(id, |previous| R::replay(previous, id, added, at), at)
            .await
    }

    pub async fn remove_watched(
        &self,
        ids: impl IntoIterator<Item = MediaId>,
        at: DateTime<Utc>,
    ) -> bool {
        self.watched.remove(ids, at).await
    }

    pub async fn watched_updated_at(&self) -> Option<DateTime<Utc>> {
        self.watched.updated_at().await
    }

    pub async fn updated_at(&self, collection: Collection) -> Option<DateTime<Utc>> {
        match collection {
            Collection::Watchlist => self.watchlist_updated_at().await,
            Collection::Watched => self.watched_updated_at().await,
        }
    }

    /// Forgets both collections. After this every read behaves as never hydrated.
    pub async fn clear(&self) {
        self.watchlist.clear().await;
        self.watched.clear().await;
    }
}

/// Every store owned by one signed-in session.
#[derive(Debug, Clone)]
pub struct SyncStores {
    pub shows: Arc<ShowStore>,
    pub movies: Arc<MovieStore>,
    pub episodes: Arc<EpisodeStore>,
    /// Last known good "up next" list.
    pub up_next: Arc<TimestampedSnapshot<Vec<ProgressShow>>>,
}

impl SyncStores {
    pub fn new() -> Self {
        Self {
            shows: Arc::new(SyncStore::new(MediaKind::Show)),
            movies: Arc::new(SyncStore::new(MediaKind::Movie)),
            episodes: Arc::new(SyncStore::new(MediaKind::Episode)),
            up_next: Arc::new(TimestampedSnapshot::new()),
        }
    }

    /// Logout teardown.
    pub async fn clear(&self) {
        self.shows.clear().await;
        self.movies.clear().await;
        self.episodes.clear().await;
        self.up_next.clear().await;
        info!("sync stores cleared");
    }
}

impl Default for SyncStores {
    fn default() -> Self {
        Self::new()
    }
}

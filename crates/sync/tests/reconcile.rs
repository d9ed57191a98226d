use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use watchsync_core::{Collection, GatewayError, MediaId, MediaKind, SyncError};
use watchsync_gateway::{InMemoryGateway, WatchedDto, WatchlistEntryDto};
use watchsync_sync::{SyncConfig, SyncSession};

fn t(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, hour, 0, 0).unwrap()
}

fn listed(ids: &[u64]) -> Vec<WatchlistEntryDto> {
    ids.iter()
        .map(|&id| WatchlistEntryDto {
            id: MediaId(id),
            listed_at: t(1),
        })
        .collect()
}

fn watched(id: u64, plays: u32, aired: Option<u32>) -> WatchedDto {
    WatchedDto {
        id: MediaId(id),
        plays,
        last_watched_at: t(2),
        episodes_aired: aired,
    }
}

/// Session over a fresh in-memory remote.
fn session() -> (SyncSession, Arc<InMemoryGateway>) {
    let gateway = Arc::new(InMemoryGateway::new());
    let session = SyncSession::new(gateway.clone(), SyncConfig::default());
    (session, gateway)
}

#[tokio::test]
async fn reads_hydrate_once_then_stay_local() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Movie, listed(&[1, 2])).await;
    let movies = session.movies().collection();

    assert!(movies.is_watchlisted(MediaId(1)).await.unwrap());
    assert!(!movies.is_watchlisted(MediaId(3)).await.unwrap());
    assert!(movies.is_watchlisted(MediaId(2)).await.unwrap());

    assert_eq!(gateway.calls("get_watchlist").await, 1);
}

#[tokio::test]
async fn watchlist_add_writes_through_after_remote_success() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Show, listed(&[1])).await;
    let shows = session.shows();

    assert!(!shows.collection().is_watchlisted(MediaId(5)).await.unwrap());
    shows.watchlist().add(MediaId(5)).await.unwrap();

    assert!(shows.collection().is_watchlisted(MediaId(5)).await.unwrap());
    assert_eq!(gateway.calls("get_watchlist").await, 1);
    assert!(gateway.remote_watchlist(MediaKind::Show).await.contains(&MediaId(5)));
}

#[tokio::test]
async fn failed_remote_write_leaves_cache_untouched() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Movie, listed(&[1])).await;
    let movies = session.movies();
    movies.collection().watchlist().await.unwrap();
    let before = movies.store().watchlist_updated_at().await;

    gateway.fail_next(GatewayError::Network("offline".into())).await;
    let err = movies.watchlist().remove(MediaId(1)).await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.code(), "network");
    assert!(movies.collection().is_watchlisted(MediaId(1)).await.unwrap());
    assert_eq!(movies.store().watchlist_updated_at().await, before);
}

#[tokio::test]
async fn failed_watchlist_add_leaves_cache_untouched() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Movie, listed(&[1])).await;
    let movies = session.movies();
    movies.collection().watchlist().await.unwrap();
    let before = movies.store().watchlist_updated_at().await;

    gateway.fail_next(GatewayError::Unauthorized).await;
    let err = movies.watchlist().add(MediaId(2)).await.unwrap_err();

    assert_eq!(err.code(), "unauthorized");
    assert!(!movies.collection().is_watchlisted(MediaId(2)).await.unwrap());
    assert_eq!(movies.store().watchlist_updated_at().await, before);
    assert!(!gateway.remote_watchlist(MediaKind::Movie).await.contains(&MediaId(2)));
}

#[tokio::test]
async fn failed_history_add_leaves_both_caches_untouched() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Movie, listed(&[1])).await;
    gateway.seed_watched(MediaKind::Movie, vec![watched(1, 2, None)]).await;
    let movies = session.movies();
    let collection = movies.collection();
    collection.watchlist().await.unwrap();
    collection.watched().await.unwrap();
    let watchlist_before = movies.store().watchlist_updated_at().await;
    let watched_before = movies.store().watched_updated_at().await;

    gateway
        .fail_next(GatewayError::Http {
            status: 503,
            message: "unavailable".into(),
        })
        .await;
    let err = movies.history().add(MediaId(1), t(20)).await.unwrap_err();

    assert!(err.is_transient());
    let record = collection.watched_record(MediaId(1)).await.unwrap().unwrap();
    assert_eq!(record.plays, 2);
    assert_eq!(record.last_watched_at, t(2));
    assert!(collection.is_watchlisted(MediaId(1)).await.unwrap());
    assert_eq!(movies.store().watchlist_updated_at().await, watchlist_before);
    assert_eq!(movies.store().watched_updated_at().await, watched_before);
}

#[tokio::test]
async fn write_to_cold_watchlist_is_picked_up_by_next_read() {
    let (session, gateway) = session();
    let movies = session.movies();

    movies.watchlist().add(MediaId(8)).await.unwrap();
    assert_eq!(movies.store().watchlist().await, None);

    assert!(movies.collection().is_watchlisted(MediaId(8)).await.unwrap());
    assert_eq!(gateway.calls("get_watchlist").await, 1);
}

#[tokio::test]
async fn dropped_write_changes_nothing() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Movie, listed(&[1])).await;
    let movies = session.movies();
    movies.collection().watchlist().await.unwrap();
    let before = movies.store().watchlist_updated_at().await;

    gateway.set_latency(Some(Duration::from_millis(500))).await;
    let change = movies.watchlist();
    let outcome = tokio::time::timeout(Duration::from_millis(20), change.add(MediaId(9))).await;
    assert!(outcome.is_err());
    gateway.set_latency(None).await;

    assert!(!movies.collection().is_watchlisted(MediaId(9)).await.unwrap());
    assert_eq!(movies.store().watchlist_updated_at().await, before);
    assert!(!gateway.remote_watchlist(MediaKind::Movie).await.contains(&MediaId(9)));
}

#[tokio::test]
async fn marking_a_movie_watched_adds_a_play_and_unlists_it() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Movie, listed(&[1])).await;
    gateway.seed_watched(MediaKind::Movie, vec![watched(1, 2, None)]).await;
    let movies = session.movies();
    let collection = movies.collection();
    assert_eq!(collection.watched_record(MediaId(1)).await.unwrap().unwrap().plays, 2);
    assert!(collection.is_watchlisted(MediaId(1)).await.unwrap());

    let added = movies.history().add(MediaId(1), t(20)).await.unwrap();

    assert_eq!(added, 1);
    let record = collection.watched_record(MediaId(1)).await.unwrap().unwrap();
    assert_eq!(record.plays, 3);
    assert!(record.last_watched_at > t(2));
    assert!(!collection.is_watchlisted(MediaId(1)).await.unwrap());
    assert_eq!(gateway.calls("get_watched").await, 1);
}

#[tokio::test]
async fn marking_a_show_watched_counts_remote_episodes() {
    let (session, gateway) = session();
    gateway.seed_watched(MediaKind::Show, vec![watched(10, 3, Some(8))]).await;
    let shows = session.shows();
    let collection = shows.collection();
    assert!(!collection.watched_record(MediaId(10)).await.unwrap().unwrap().is_fully_watched());

    let added = shows.history().add(MediaId(10), t(21)).await.unwrap();

    assert_eq!(added, 5);
    let record = collection.watched_record(MediaId(10)).await.unwrap().unwrap();
    assert_eq!(record.plays, 8);
    assert!(record.is_fully_watched());
}

#[tokio::test]
async fn first_show_watch_matches_what_the_remote_reports() {
    let (session, gateway) = session();
    gateway.seed_episodes_aired(MediaId(10), 8).await;
    let shows = session.shows();
    assert_eq!(shows.collection().watched_record(MediaId(10)).await.unwrap(), None);

    let added = shows.history().add(MediaId(10), t(21)).await.unwrap();
    let cached = shows.collection().watched_record(MediaId(10)).await.unwrap().unwrap();

    session.logout().await;
    let remote = shows.collection().watched_record(MediaId(10)).await.unwrap().unwrap();

    assert_eq!(added, 8);
    assert_eq!(cached.plays, remote.plays);
    assert_eq!(cached.episodes_aired, remote.episodes_aired);
    assert!(cached.is_fully_watched());
    assert!(remote.is_fully_watched());
}

#[tokio::test]
async fn removing_history_drops_the_cached_record() {
    let (session, gateway) = session();
    gateway.seed_watched(MediaKind::Episode, vec![watched(4, 1, None)]).await;
    let episodes = session.episodes();
    assert!(episodes.collection().watched_record(MediaId(4)).await.unwrap().is_some());

    episodes.history().remove(MediaId(4)).await.unwrap();
    assert_eq!(episodes.collection().watched_record(MediaId(4)).await.unwrap(), None);

    let err = episodes.history().remove(MediaId(99)).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Gateway(GatewayError::NotFound {
            kind: MediaKind::Episode,
            id: 99
        })
    ));
}

#[tokio::test]
async fn kinds_do_not_share_ids() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Show, listed(&[7])).await;
    gateway.seed_watchlist(MediaKind::Movie, listed(&[])).await;

    assert!(session.shows().collection().is_watchlisted(MediaId(7)).await.unwrap());
    assert!(!session.movies().collection().is_watchlisted(MediaId(7)).await.unwrap());
}

#[tokio::test]
async fn local_write_marks_loaded_screen_stale() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Movie, listed(&[1])).await;
    let movies = session.movies();
    let status = movies.status();

    assert!(!status.is_sync_required(Collection::Watchlist, None).await);
    movies.collection().watchlist().await.unwrap();
    let loaded_at = movies.store().watchlist_updated_at().await;
    assert!(!status.is_sync_required(Collection::Watchlist, loaded_at).await);

    tokio::time::sleep(Duration::from_millis(5)).await;
    movies.watchlist().add(MediaId(2)).await.unwrap();

    assert!(status.is_sync_required(Collection::Watchlist, loaded_at).await);
    assert!(!status.is_sync_required(Collection::Watched, loaded_at).await);
}

#[tokio::test]
async fn concurrent_cold_reads_agree() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Movie, listed(&[1, 2, 3])).await;
    let a = session.movies().collection();
    let b = session.movies().collection();

    let (first, second) = tokio::join!(a.watchlist(), b.watchlist());

    assert_eq!(first.unwrap(), second.unwrap());
    let fetches = gateway.calls("get_watchlist").await;
    assert!((1..=2).contains(&fetches));
}

#[tokio::test]
async fn logout_forgets_everything() {
    let (session, gateway) = session();
    gateway.seed_watchlist(MediaKind::Movie, listed(&[1])).await;
    let movies = session.movies();
    movies.collection().watchlist().await.unwrap();

    session.logout().await;

    assert_eq!(movies.store().watchlist().await, None);
    assert_eq!(session.stores().up_next.get().await, None);
    assert!(movies.collection().is_watchlisted(MediaId(1)).await.unwrap());
    assert_eq!(gateway.calls("get_watchlist").await, 2);
}

//! Gateway backed by in-process state.
//!
//! Behaves like the remote service for the calls the sync core makes, counts
//! every call by method name and can be told to fail or stall, which is what
//! the use-case tests rely on.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use watchsync_core::{GatewayError, MediaId, MediaKind};

use crate::dto::{
    CalendarMovieDto, CalendarShowDto, HistoryAddedDto, HistoryDto, ProgressDto,
    WatchlistEntryDto, WatchedDto, WatchlistSort,
};
use crate::gateway::SyncGateway;

#[derive(Default)]
struct State {
    watchlists: HashMap<MediaKind, Vec<WatchlistEntryDto>>,
    watched: HashMap<MediaKind, HashMap<MediaId, WatchedDto>>,
    episodes_aired: HashMap<MediaId, u32>,
    progress: Vec<ProgressDto>,
    show_calendar: Vec<CalendarShowDto>,
    movie_calendar: Vec<CalendarMovieDto>,
    history: HashMap<MediaKind, Vec<HistoryDto>>,
    calls: HashMap<&'static str, usize>,
    fail_next: Option<GatewayError>,
    latency: Option<Duration>,
}

#[derive(Default)]
pub struct InMemoryGateway {
    state: Mutex<State>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_watchlist(&self, kind: MediaKind, entries: Vec<WatchlistEntryDto>) {
        self.state.lock().await.watchlists.insert(kind, entries);
    }

    pub async fn seed_watched(&self, kind: MediaKind, entries: Vec<WatchedDto>) {
        let map = entries.into_iter().map(|e| (e.id, e)).collect();
        self.state.lock().await.watched.insert(kind, map);
    }

    /// Aired episode count used when a show without prior plays is marked watched.
    pub async fn seed_episodes_aired(&self, show: MediaId, aired: u32) {
        self.state.lock().await.episodes_aired.insert(show, aired);
    }

    pub async fn seed_progress(&self, items: Vec<ProgressDto>) {
        self.state.lock().await.progress = items;
    }

    pub async fn seed_show_calendar(&self, items: Vec<CalendarShowDto>) {
        self.state.lock().await.show_calendar = items;
    }

    pub async fn seed_movie_calendar(&self, items: Vec<CalendarMovieDto>) {
        self.state.lock().await.movie_calendar = items;
    }

    pub async fn seed_history(&self, kind: MediaKind, items: Vec<HistoryDto>) {
        self.state.lock().await.history.insert(kind, items);
    }

    /// The next call, whatever it is, fails with `err` and changes nothing.
    pub async fn fail_next(&self, err: GatewayError) {
        self.state.lock().await.fail_next = Some(err);
    }

    /// Every call sleeps this long before touching any state.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().await.latency = latency;
    }

    /// Number of calls made to `method` (the trait method name).
    pub async fn calls(&self, method: &str) -> usize {
        self.state.lock().await.calls.get(method).copied().unwrap_or(0)
    }

    pub async fn total_calls(&self) -> usize {
        self.state.lock().await.calls.values().sum()
    }

    /// Remote-side view of the watchlist, for assertions.
    pub async fn remote_watchlist(&self, kind: MediaKind) -> Vec<MediaId> {
        let state = self.state.lock().await;
        state
            .watchlists
            .get(&kind)
            .map(|entries| entries.iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    async fn begin(&self, method: &'static str) -> Result<(), GatewayError> {
        let (failure, latency) = {
            let mut state = self.state.lock().await;
            *state.calls.entry(method).or_default() += 1;
            (state.fail_next.take(), state.latency)
        };
        debug!(method, "in-memory gateway call");
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn paginate<T: Clone>(items: &[T], page: Option<u32>, limit: Option<u32>) -> Vec<T> {
    let Some(limit) = limit else {
        return items.to_vec();
    };
    let page = page.unwrap_or(1).max(1);
    items
        .iter()
        .skip(((page - 1) * limit) as usize)
        .take(limit as usize)
        .cloned()
        .collect()
}

fn in_window(at: DateTime<Utc>, start: NaiveDate, days: u32) -> bool {
    let day = at.date_naive();
    let end = start
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    day >= start && day < end
}

#[async_trait::async_trait]
impl SyncGateway for InMemoryGateway {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn get_watchlist(
        &self,
        kind: MediaKind,
        sort: WatchlistSort,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<WatchlistEntryDto>, GatewayError> {
        self.begin("get_watchlist").await?;
        let state = self.state.lock().await;
        let mut entries = state.watchlists.get(&kind).cloned().unwrap_or_default();
        if sort == WatchlistSort::Added {
            entries.sort_by(|a, b| b.listed_at.cmp(&a.listed_at));
        }
        Ok(paginate(&entries, page, limit))
    }

    async fn get_watched(&self, kind: MediaKind) -> Result<Vec<WatchedDto>, GatewayError> {
        self.begin("get_watched").await?;
        let state = self.state.lock().await;
        let mut items: Vec<WatchedDto> = state
            .watched
            .get(&kind)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        items.sort_by_key(|w| w.id);
        Ok(items)
    }

    async fn add_to_watchlist(&self, kind: MediaKind, id: MediaId) -> Result<(), GatewayError> {
        self.begin("add_to_watchlist").await?;
        let mut state = self.state.lock().await;
        let entries = state.watchlists.entry(kind).or_default();
        if !entries.iter().any(|e| e.id == id) {
            entries.push(WatchlistEntryDto {
                id,
                listed_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn remove_from_watchlist(
        &self,
        kind: MediaKind,
        id: MediaId,
    ) -> Result<(), GatewayError> {
        self.begin("remove_from_watchlist").await?;
        let mut state = self.state.lock().await;
        if let Some(entries) = state.watchlists.get_mut(&kind) {
            entries.retain(|e| e.id != id);
        }
        Ok(())
    }

    async fn add_to_history(
        &self,
        kind: MediaKind,
        id: MediaId,
        watched_at: DateTime<Utc>,
    ) -> Result<HistoryAddedDto, GatewayError> {
        self.begin("add_to_history").await?;
        if kind == MediaKind::Person {
            return Err(GatewayError::Http {
                status: 422,
                message: "people have no watch history".into(),
            });
        }
        let mut state = self.state.lock().await;
        let aired = state.episodes_aired.get(&id).copied();

        let added = {
            let watched = state.watched.entry(kind).or_default();
            let entry = watched.entry(id).or_insert_with(|| WatchedDto {
                id,
                plays: 0,
                last_watched_at: watched_at,
                episodes_aired: aired,
            });
            let added = match kind {
                MediaKind::Show => entry
                    .episodes_aired
                    .unwrap_or(0)
                    .saturating_sub(entry.plays),
                _ => 1,
            };
            entry.plays += added;
            entry.last_watched_at = watched_at;
            added
        };

        if let Some(entries) = state.watchlists.get_mut(&kind) {
            entries.retain(|e| e.id != id);
        }

        Ok(match kind {
            MediaKind::Movie => HistoryAddedDto {
                movies: added,
                episodes: 0,
            },
            _ => HistoryAddedDto {
                movies: 0,
                episodes: added,
            },
        })
    }

    async fn remove_from_history(
        &self,
        kind: MediaKind,
        id: MediaId,
    ) -> Result<(), GatewayError> {
        self.begin("remove_from_history").await?;
        let mut state = self.state.lock().await;
        let removed = state
            .watched
            .get_mut(&kind)
            .and_then(|m| m.remove(&id))
            .is_some();
        if removed {
            Ok(())
        } else {
            Err(GatewayError::NotFound { kind, id: id.get() })
        }
    }

    async fn get_up_next_progress(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ProgressDto>, GatewayError> {
        self.begin("get_up_next_progress").await?;
        let state = self.state.lock().await;
        Ok(paginate(&state.progress, Some(page), Some(limit)))
    }

    async fn get_show_calendar(
        &self,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<CalendarShowDto>, GatewayError> {
        self.begin("get_show_calendar").await?;
        let state = self.state.lock().await;
        Ok(state
            .show_calendar
            .iter()
            .filter(|c| in_window(c.first_aired, start, days))
            .cloned()
            .collect())
    }

    async fn get_movie_calendar(
        &self,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<CalendarMovieDto>, GatewayError> {
        self.begin("get_movie_calendar").await?;
        let state = self.state.lock().await;
        Ok(state
            .movie_calendar
            .iter()
            .filter(|c| in_window(c.released, start, days))
            .cloned()
            .collect())
    }

    async fn get_history(
        &self,
        kind: MediaKind,
        page: u32,
        limit: u32,
    ) -> Result<Vec<HistoryDto>, GatewayError> {
        self.begin("get_history").await?;
        let state = self.state.lock().await;
        let mut items = state.history.get(&kind).cloned().unwrap_or_default();
        items.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
        Ok(paginate(&items, Some(page), Some(limit)))
    }
}

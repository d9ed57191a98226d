//! Weekly release calendar merging show episodes and movies.
//!
//! The remote is asked for a window one day wider than the week on each
//! side because it buckets by UTC date; entries are then kept by their
//! *local* date. Product rules that shape the list (collapsing full-season
//! drops, genre shelves) are supplied as a [`CalendarPolicy`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{debug, warn};
use watchsync_core::feed::{CalendarEntry, CalendarItem, DayGroup, group_by_day};
use watchsync_core::{MediaId, Result};
use watchsync_gateway::SyncGateway;

use crate::config::SyncConfig;

/// Days requested from the remote: the displayed week plus one day of
/// slack before and after.
pub const CALENDAR_FETCH_DAYS: u32 = 9;

/// Keeps an entry when it returns true.
pub type EntryFilter = Arc<dyn Fn(&CalendarEntry) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct CalendarPolicy {
    /// Show only the opening episode of a season that drops all at once.
    pub collapse_full_seasons: bool,
    pub filter: Option<EntryFilter>,
}

impl CalendarPolicy {
    pub fn collapsing() -> Self {
        Self {
            collapse_full_seasons: true,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl std::fmt::Debug for CalendarPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarPolicy")
            .field("collapse_full_seasons", &self.collapse_full_seasons)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Keeps entries tagged with any of `genres` (case-insensitive), e.g. a
/// seasonal horror shelf.
pub fn genre_filter<I, S>(genres: I) -> EntryFilter
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let wanted: Vec<String> = genres
        .into_iter()
        .map(|g| g.as_ref().to_lowercase())
        .collect();
    Arc::new(move |entry: &CalendarEntry| {
        entry
            .genres()
            .iter()
            .any(|g| wanted.contains(&g.to_lowercase()))
    })
}

pub struct Calendar {
    gateway: Arc<dyn SyncGateway>,
    config: Arc<SyncConfig>,
    policy: CalendarPolicy,
}

impl Calendar {
    pub fn new(
        gateway: Arc<dyn SyncGateway>,
        config: Arc<SyncConfig>,
        policy: CalendarPolicy,
    ) -> Self {
        Self {
            gateway,
            config,
            policy,
        }
    }

    /// Releases for the local week starting at `week_start`, grouped by day.
    pub async fn week(&self, week_start: NaiveDate) -> Result<Vec<DayGroup<CalendarEntry>>> {
        let fetch_start = week_start.pred_opt().unwrap_or(week_start);

        let (shows, movies) = tokio::try_join!(
            self.gateway.get_show_calendar(fetch_start, CALENDAR_FETCH_DAYS),
            self.gateway.get_movie_calendar(fetch_start, CALENDAR_FETCH_DAYS),
        )
        .inspect_err(|e| warn!(%week_start, error = %e, "failed to fetch calendar"))?;

        debug!(
            %week_start,
            shows = shows.len(),
            movies = movies.len(),
            "calendar fetched"
        );

        let entries = shows
            .into_iter()
            .map(CalendarEntry::from)
            .chain(movies.into_iter().map(CalendarEntry::from))
            .collect();

        Ok(arrange_week(entries, week_start, &self.config, &self.policy))
    }
}

/// Applies the policy, keeps the local week, orders by release time and
/// groups by local day. Entries released at the same instant keep their
/// input order.
pub fn arrange_week(
    entries: Vec<CalendarEntry>,
    week_start: NaiveDate,
    config: &SyncConfig,
    policy: &CalendarPolicy,
) -> Vec<DayGroup<CalendarEntry>> {
    let week_end = week_start
        .checked_add_days(Days::new(6))
        .unwrap_or(NaiveDate::MAX);

    let mut entries = if policy.collapse_full_seasons {
        collapse_full_seasons(entries)
    } else {
        entries
    };

    entries.retain(|entry| {
        let day = config.local_date(entry.released_at);
        day >= week_start && day <= week_end
    });
    if let Some(filter) = &policy.filter {
        entries.retain(|entry| filter(entry));
    }

    entries.sort_by_key(|entry| entry.released_at);
    group_by_day(entries, |entry| config.local_date(entry.released_at))
}

/// For every show whose episodes in the list include both a season premiere
/// and a season finale (and more than one episode), keeps only episode 1.
/// Movies and other shows pass through untouched.
pub fn collapse_full_seasons(entries: Vec<CalendarEntry>) -> Vec<CalendarEntry> {
    #[derive(Default)]
    struct Markers {
        episodes: usize,
        premiere: bool,
        finale: bool,
    }

    let mut by_show: HashMap<MediaId, Markers> = HashMap::new();
    for entry in &entries {
        if let CalendarItem::Episode { show, episode } = &entry.item {
            let markers = by_show.entry(show.id).or_default();
            markers.episodes += 1;
            markers.premiere |= episode.episode_type.is_premiere();
            markers.finale |= episode.episode_type.is_finale();
        }
    }

    let full: Vec<MediaId> = by_show
        .into_iter()
        .filter(|(_, m)| m.premiere && m.finale && m.episodes > 1)
        .map(|(id, _)| id)
        .collect();
    if full.is_empty() {
        return entries;
    }
    debug!(shows = full.len(), "collapsing full-season drops");

    entries
        .into_iter()
        .filter(|entry| match &entry.item {
            CalendarItem::Episode { show, episode } if full.contains(&show.id) => {
                episode.number == 1
            }
            _ => true,
        })
        .collect()
}

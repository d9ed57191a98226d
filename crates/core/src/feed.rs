//! Derived views built by the aggregation use cases.
//!
//! None of these are authoritative: they are rebuilt from the remote on every
//! fetch and only cached as "last known good" for display.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::media::{Episode, Movie, Show};

/// One row of the "up next" list: a show and the episode to watch next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressShow {
    pub show: Show,
    pub last_watched_at: Option<DateTime<Utc>>,
    pub aired: u32,
    pub completed: u32,
    pub last_episode: Option<Episode>,
    pub next_episode: Episode,
}

impl ProgressShow {
    pub fn remaining(&self) -> u32 {
        self.aired.saturating_sub(self.completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalendarItem {
    Episode { show: Show, episode: Episode },
    Movie { movie: Movie },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub released_at: DateTime<Utc>,
    pub item: CalendarItem,
}

impl CalendarEntry {
    pub fn genres(&self) -> &[String] {
        match &self.item {
            CalendarItem::Episode { show, .. } => &show.genres,
            CalendarItem::Movie { movie } => &movie.genres,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryItem {
    Episode { show: Show, episode: Episode },
    Movie { movie: Movie },
}

/// A single play from the remote history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub history_id: u64,
    pub watched_at: DateTime<Utc>,
    pub item: HistoryItem,
}

/// Items that fall on the same local calendar day, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroup<T> {
    pub day: NaiveDate,
    pub items: Vec<T>,
}

/// Groups items by `day`, keeping the order in which each day first appears
/// and the order of items within a day.
pub fn group_by_day<T>(
    items: impl IntoIterator<Item = T>,
    day: impl Fn(&T) -> NaiveDate,
) -> Vec<DayGroup<T>> {
    let mut groups: Vec<DayGroup<T>> = Vec::new();
    for item in items {
        let key = day(&item);
        match groups.iter_mut().find(|g| g.day == key) {
            Some(group) => group.items.push(item),
            None => groups.push(DayGroup {
                day: key,
                items: vec![item],
            }),
        }
    }
    groups
}

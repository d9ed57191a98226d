//! Payloads returned by the remote, already decoded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use watchsync_core::feed::{CalendarEntry, CalendarItem, HistoryEntry, HistoryItem, ProgressShow};
use watchsync_core::media::{Episode, Movie, Show};
use watchsync_core::{MediaId, ShowWatchRecord, SyncError, WatchRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchlistSort {
    #[default]
    Rank,
    Added,
    Title,
    Released,
}

impl WatchlistSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Added => "added",
            Self::Title => "title",
            Self::Released => "released",
        }
    }
}

impl std::str::FromStr for WatchlistSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rank" => Ok(Self::Rank),
            "added" => Ok(Self::Added),
            "title" => Ok(Self::Title),
            "released" => Ok(Self::Released),
            other => Err(format!("unknown watchlist sort: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntryDto {
    pub id: MediaId,
    pub listed_at: DateTime<Utc>,
}

/// One item of the remote "watched" collection. `episodes_aired` is only
/// sent for shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedDto {
    pub id: MediaId,
    pub plays: u32,
    pub last_watched_at: DateTime<Utc>,
    #[serde(default)]
    pub episodes_aired: Option<u32>,
}

impl From<WatchedDto> for WatchRecord {
    fn from(dto: WatchedDto) -> Self {
        Self {
            id: dto.id,
            plays: dto.plays,
            last_watched_at: dto.last_watched_at,
        }
    }
}

impl From<WatchedDto> for ShowWatchRecord {
    fn from(dto: WatchedDto) -> Self {
        Self {
            id: dto.id,
            plays: dto.plays,
            last_watched_at: dto.last_watched_at,
            episodes_aired: dto.episodes_aired.unwrap_or(0),
        }
    }
}

/// How many plays a history write added on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryAddedDto {
    pub movies: u32,
    pub episodes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDto {
    pub show: Show,
    pub last_watched_at: Option<DateTime<Utc>>,
    pub aired: u32,
    pub completed: u32,
    pub last_episode: Option<Episode>,
    pub next_episode: Option<Episode>,
}

impl ProgressDto {
    /// `None` for shows with nothing left to watch.
    pub fn into_progress(self) -> Option<ProgressShow> {
        let next_episode = self.next_episode?;
        Some(ProgressShow {
            show: self.show,
            last_watched_at: self.last_watched_at,
            aired: self.aired,
            completed: self.completed,
            last_episode: self.last_episode,
            next_episode,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarShowDto {
    pub first_aired: DateTime<Utc>,
    pub show: Show,
    pub episode: Episode,
}

impl From<CalendarShowDto> for CalendarEntry {
    fn from(dto: CalendarShowDto) -> Self {
        Self {
            released_at: dto.first_aired,
            item: CalendarItem::Episode {
                show: dto.show,
                episode: dto.episode,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMovieDto {
    pub released: DateTime<Utc>,
    pub movie: Movie,
}

impl From<CalendarMovieDto> for CalendarEntry {
    fn from(dto: CalendarMovieDto) -> Self {
        Self {
            released_at: dto.released,
            item: CalendarItem::Movie { movie: dto.movie },
        }
    }
}

/// One play from the remote history log. Exactly one of `movie` or
/// `show` + `episode` is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDto {
    pub id: u64,
    pub watched_at: DateTime<Utc>,
    #[serde(default)]
    pub movie: Option<Movie>,
    #[serde(default)]
    pub show: Option<Show>,
    #[serde(default)]
    pub episode: Option<Episode>,
}

impl TryFrom<HistoryDto> for HistoryEntry {
    type Error = SyncError;

    fn try_from(dto: HistoryDto) -> Result<Self, Self::Error> {
        let item = match (dto.movie, dto.show, dto.episode) {
            (Some(movie), None, None) => HistoryItem::Movie { movie },
            (None, Some(show), Some(episode)) => HistoryItem::Episode { show, episode },
            _ => {
                return Err(SyncError::InvalidPayload(format!(
                    "history item {} must carry either a movie or a show episode",
                    dto.id
                )));
            }
        };
        Ok(Self {
            history_id: dto.id,
            watched_at: dto.watched_at,
            item,
        })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote identifier of a show, movie, episode or person.
///
/// Ids are only unique within one [`MediaKind`]; a show and a movie may share
/// the same number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub u64);

impl MediaId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for MediaId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Show,
    Movie,
    Episode,
    Person,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Movie => "movie",
            Self::Episode => "episode",
            Self::Person => "person",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two collections of a sync store a caller is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Watchlist,
    Watched,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Watchlist => "watchlist",
            Self::Watched => "watched",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviour shared by the per-kind watched records held in a sync store.
pub trait WatchedItem: Clone + Send + Sync + 'static {
    fn id(&self) -> MediaId;
    fn plays(&self) -> u32;
    fn last_watched_at(&self) -> DateTime<Utc>;

    /// Builds the record that replaces `previous` after `added` new plays.
    fn replay(previous: Option<&Self>, id: MediaId, added: u32, at: DateTime<Utc>) -> Self;
}

/// Watched state of a movie or an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchRecord {
    pub id: MediaId,
    pub plays: u32,
    pub last_watched_at: DateTime<Utc>,
}

impl WatchedItem for WatchRecord {
    fn id(&self) -> MediaId {
        self.id
    }

    fn plays(&self) -> u32 {
        self.plays
    }

    fn last_watched_at(&self) -> DateTime<Utc> {
        self.last_watched_at
    }

    fn replay(previous: Option<&Self>, id: MediaId, added: u32, at: DateTime<Utc>) -> Self {
        Self {
            id,
            plays: previous.map_or(0, |p| p.plays).saturating_add(added),
            last_watched_at: at,
        }
    }
}

/// Watched state of a show. `plays` counts episode plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowWatchRecord {
    pub id: MediaId,
    pub plays: u32,
    pub last_watched_at: DateTime<Utc>,
    pub episodes_aired: u32,
}

impl ShowWatchRecord {
    /// A show counts as fully watched once every aired episode has a play.
    pub fn is_fully_watched(&self) -> bool {
        self.episodes_aired > 0 && self.plays >= self.episodes_aired
    }
}

impl WatchedItem for ShowWatchRecord {
    fn id(&self) -> MediaId {
        self.id
    }

    fn plays(&self) -> u32 {
        self.plays
    }

    fn last_watched_at(&self) -> DateTime<Utc> {
        self.last_watched_at
    }

    /// Marking a show watched covers every aired episode, so the aired count
    /// is at least the new play count.
    fn replay(previous: Option<&Self>, id: MediaId, added: u32, at: DateTime<Utc>) -> Self {
        let plays = previous.map_or(0, |p| p.plays).saturating_add(added);
        Self {
            id,
            plays,
            last_watched_at: at,
            episodes_aired: previous.map_or(plays, |p| p.episodes_aired.max(plays)),
        }
    }
}

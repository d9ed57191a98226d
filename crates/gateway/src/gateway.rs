use chrono::{DateTime, NaiveDate, Utc};
use watchsync_core::{GatewayError, MediaId, MediaKind};

use crate::dto::{
    CalendarMovieDto, CalendarShowDto, HistoryAddedDto, HistoryDto, ProgressDto,
    WatchlistEntryDto, WatchedDto, WatchlistSort,
};

/// The remote watch-activity service, as seen by the sync core.
///
/// Every call is assumed to be authenticated already. Implementations must be
/// cancel-safe: dropping a returned future must not leave a half-applied
/// mutation visible to the caller.
#[async_trait::async_trait]
pub trait SyncGateway: Send + Sync {
    fn name(&self) -> &str;

    /// One page of the watchlist. `None` for both paging arguments returns
    /// everything.
    async fn get_watchlist(
        &self,
        kind: MediaKind,
        sort: WatchlistSort,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<WatchlistEntryDto>, GatewayError>;

    /// The whole watched collection for `kind`.
    async fn get_watched(&self, kind: MediaKind) -> Result<Vec<WatchedDto>, GatewayError>;

    async fn add_to_watchlist(&self, kind: MediaKind, id: MediaId) -> Result<(), GatewayError>;

    async fn remove_from_watchlist(
        &self,
        kind: MediaKind,
        id: MediaId,
    ) -> Result<(), GatewayError>;

    /// Records a play. For a show this marks every aired episode, so the
    /// returned episode count may be larger than one.
    async fn add_to_history(
        &self,
        kind: MediaKind,
        id: MediaId,
        watched_at: DateTime<Utc>,
    ) -> Result<HistoryAddedDto, GatewayError>;

    async fn remove_from_history(
        &self,
        kind: MediaKind,
        id: MediaId,
    ) -> Result<(), GatewayError>;

    async fn get_up_next_progress(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ProgressDto>, GatewayError>;

    async fn get_show_calendar(
        &self,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<CalendarShowDto>, GatewayError>;

    async fn get_movie_calendar(
        &self,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<CalendarMovieDto>, GatewayError>;

    /// Newest first.
    async fn get_history(
        &self,
        kind: MediaKind,
        page: u32,
        limit: u32,
    ) -> Result<Vec<HistoryDto>, GatewayError>;
}

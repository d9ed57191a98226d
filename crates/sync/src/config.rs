use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use tracing::warn;
use watchsync_gateway::WatchlistSort;

/// Tunables for one sync session.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Local time zone used to decide which calendar day something falls on.
    pub utc_offset: FixedOffset,
    pub watchlist_sort: WatchlistSort,
    pub watchlist_page_limit: u32,
    pub up_next_page_limit: u32,
    pub history_page_limit: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            watchlist_sort: WatchlistSort::Rank,
            watchlist_page_limit: 250,
            up_next_page_limit: 50,
            history_page_limit: 50,
        }
    }
}

impl SyncConfig {
    /// Reads `WATCHSYNC_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source. Unset keys keep their
    /// default; unparsable ones are logged and also keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("WATCHSYNC_UTC_OFFSET_MINUTES") {
            match raw
                .trim()
                .parse::<i32>()
                .ok()
                .and_then(|m| m.checked_mul(60))
                .and_then(FixedOffset::east_opt)
            {
                Some(offset) => config.utc_offset = offset,
                None => warn!(value = %raw, "invalid WATCHSYNC_UTC_OFFSET_MINUTES, using UTC"),
            }
        }

        if let Some(raw) = lookup("WATCHSYNC_WATCHLIST_SORT") {
            match raw.trim().parse() {
                Ok(sort) => config.watchlist_sort = sort,
                Err(e) => warn!(error = %e, "invalid WATCHSYNC_WATCHLIST_SORT"),
            }
        }

        read_limit(
            &lookup,
            "WATCHSYNC_WATCHLIST_PAGE_LIMIT",
            &mut config.watchlist_page_limit,
        );
        read_limit(
            &lookup,
            "WATCHSYNC_UP_NEXT_PAGE_LIMIT",
            &mut config.up_next_page_limit,
        );
        read_limit(
            &lookup,
            "WATCHSYNC_HISTORY_PAGE_LIMIT",
            &mut config.history_page_limit,
        );

        config
    }

    /// Calendar day of `at` in the configured time zone.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }
}

fn read_limit(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut u32) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<u32>() {
        Ok(v) if v > 0 => *slot = v,
        _ => warn!(key, value = %raw, "invalid page limit, keeping default"),
    }
}

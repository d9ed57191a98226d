use std::sync::Arc;

use tracing::{debug, warn};
use watchsync_core::feed::{DayGroup, HistoryEntry, group_by_day};
use watchsync_core::{MediaKind, Result};
use watchsync_gateway::SyncGateway;

use crate::config::SyncConfig;

/// Movie and episode plays merged into one timeline, newest first, grouped
/// by local day.
pub struct HistoryFeed {
    gateway: Arc<dyn SyncGateway>,
    config: Arc<SyncConfig>,
}

impl HistoryFeed {
    pub fn new(gateway: Arc<dyn SyncGateway>, config: Arc<SyncConfig>) -> Self {
        Self { gateway, config }
    }

    /// `page` is 1-based and applies to each kind separately: page N of
    /// movies is merged with page N of episodes. Ordering is exact within one
    /// page, but an entry near the end of one kind's page can be newer than
    /// entries already shown from the other kind on an earlier page.
    pub async fn page(&self, page: u32) -> Result<Vec<DayGroup<HistoryEntry>>> {
        let limit = self.config.history_page_limit;
        let (movies, episodes) = tokio::try_join!(
            self.gateway.get_history(MediaKind::Movie, page, limit),
            self.gateway.get_history(MediaKind::Episode, page, limit),
        )
        .inspect_err(|e| warn!(page, error = %e, "failed to fetch history"))?;

        let mut entries = movies
            .into_iter()
            .chain(episodes)
            .map(HistoryEntry::try_from)
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));

        debug!(page, count = entries.len(), "history merged");
        Ok(group_by_day(entries, |e| self.config.local_date(e.watched_at)))
    }
}

//! "Up next": one row per show in progress, pointing at the next episode.
//!
//! The last good list is kept in a snapshot cache so a screen can render it
//! immediately while the live list is fetched (stale-while-revalidate).

use std::sync::Arc;

use async_stream::try_stream;
use chrono::Utc;
use futures::Stream;
use tracing::{debug, info, warn};
use watchsync_core::Result;
use watchsync_core::feed::ProgressShow;
use watchsync_gateway::SyncGateway;
use watchsync_store::TimestampedSnapshot;

use crate::config::SyncConfig;

const MAX_PROGRESS_PAGES: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpNextUpdate {
    /// Last known good list from a previous fetch.
    Cached(Vec<ProgressShow>),
    /// Freshly fetched list; the cache now holds the same data.
    Live(Vec<ProgressShow>),
}

impl UpNextUpdate {
    pub fn items(&self) -> &[ProgressShow] {
        match self {
            Self::Cached(items) | Self::Live(items) => items,
        }
    }
}

pub struct UpNext {
    snapshot: Arc<TimestampedSnapshot<Vec<ProgressShow>>>,
    gateway: Arc<dyn SyncGateway>,
    config: Arc<SyncConfig>,
}

impl UpNext {
    pub fn new(
        snapshot: Arc<TimestampedSnapshot<Vec<ProgressShow>>>,
        gateway: Arc<dyn SyncGateway>,
        config: Arc<SyncConfig>,
    ) -> Self {
        Self {
            snapshot,
            gateway,
            config,
        }
    }

    pub async fn cached(&self) -> Option<Vec<ProgressShow>> {
        self.snapshot.get().await
    }

    /// Fetches every progress page, replaces the cached list and returns it.
    /// On failure the cached list is kept.
    pub async fn refresh(&self) -> Result<Vec<ProgressShow>> {
        let limit = self.config.up_next_page_limit;
        let mut items = Vec::new();

        for page in 1..=MAX_PROGRESS_PAGES {
            let dtos = self
                .gateway
                .get_up_next_progress(page, limit)
                .await
                .inspect_err(|e| warn!(page, error = %e, "failed to fetch up next page"))?;
            let fetched = dtos.len();
            items.extend(dtos.into_iter().filter_map(|dto| dto.into_progress()));
            if fetched < limit as usize {
                break;
            }
            if page == MAX_PROGRESS_PAGES {
                warn!(pages = page, "up next paging stopped at page cap");
            }
        }

        sort_progress(&mut items);
        self.snapshot.set(items.clone(), Utc::now()).await;
        info!(
            count = items.len(),
            remaining = items.iter().map(ProgressShow::remaining).sum::<u32>(),
            "up next refreshed"
        );
        Ok(items)
    }

    /// Cached list first (if there is one), then the live list.
    ///
    /// If the live fetch fails the stream ends with that error after the
    /// cached list was already delivered.
    pub fn updates(&self) -> impl Stream<Item = Result<UpNextUpdate>> + Send + '_ {
        try_stream! {
            if let Some(cached) = self.cached().await {
                debug!(count = cached.len(), "serving cached up next");
                yield UpNextUpdate::Cached(cached);
            }
            let live = self.refresh().await?;
            yield UpNextUpdate::Live(live);
        }
    }
}

/// Most recently watched first; shows never watched go last. Stable.
fn sort_progress(items: &mut [ProgressShow]) {
    items.sort_by(|a, b| b.last_watched_at.cmp(&a.last_watched_at));
}

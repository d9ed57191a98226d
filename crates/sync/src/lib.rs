//! Reconciliation and aggregation on top of the session caches.
//!
//! Reads hydrate a cold collection from the gateway once and then stay
//! local. Writes go to the gateway first and reach the cache only after the
//! remote call succeeds; dropping a call mid-flight writes nothing.

pub mod calendar;
pub mod collection;
pub mod config;
pub mod history;
pub mod history_feed;
pub mod session;
pub mod status;
pub mod up_next;
pub mod watchlist;

pub use calendar::{Calendar, CalendarPolicy, EntryFilter, genre_filter};
pub use collection::CollectionState;
pub use config::SyncConfig;
pub use history::ChangeHistory;
pub use history_feed::HistoryFeed;
pub use session::{MediaSync, SyncSession};
pub use status::SyncStatus;
pub use up_next::{UpNext, UpNextUpdate};
pub use watchlist::ChangeWatchlist;

pub mod error;
pub mod feed;
pub mod media;
pub mod types;

pub use error::{GatewayError, Result, SyncError};
pub use types::{Collection, MediaId, MediaKind, ShowWatchRecord, WatchRecord, WatchedItem};

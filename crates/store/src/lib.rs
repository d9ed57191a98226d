pub mod sync_store;
pub mod timestamped;

pub use sync_store::{EpisodeStore, MovieStore, ShowStore, SyncStore, SyncStores};
pub use timestamped::{Hydration, Lookup, TimestampedMap, TimestampedSet, TimestampedSnapshot};

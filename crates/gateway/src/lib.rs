pub mod dto;
pub mod gateway;
pub mod memory;

pub use dto::{
    CalendarMovieDto, CalendarShowDto, HistoryAddedDto, HistoryDto, ProgressDto,
    WatchlistEntryDto, WatchedDto, WatchlistSort,
};
pub use gateway::SyncGateway;
pub use memory::InMemoryGateway;
pub use watchsync_core::GatewayError;

pub mod fetch_sequencer;
pub mod outbox_dispatcher;
pub mod sync_repository;

pub use fetch_sequencer::FetchSequencer;
pub use outbox_dispatcher::OutboxDispatcher;
pub use sync_repository::{
    Freshness, ReadOutcome, StoryFeed, StoryRepository, SyncRepository, WriteOutcome,
};

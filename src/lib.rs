//! Offline-first sync engine for a social client: entity cache, outbox,
//! replay dispatcher and story reconciliation.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
mod state;

pub use shared::logging::init_logging;
pub use shared::{AppConfig, AppError, Result};
pub use state::{RemoteSet, SyncEngine};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync bookkeeping carried by every cached entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMeta {
    pub is_synced: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncMeta {
    pub fn synced_at(at: DateTime<Utc>) -> Self {
        Self {
            is_synced: true,
            last_synced_at: Some(at),
        }
    }

    pub fn pending() -> Self {
        Self::default()
    }

    /// Local edits restart the sync cycle but keep the last confirmation time.
    pub fn mark_pending(&mut self) {
        self.is_synced = false;
    }
}

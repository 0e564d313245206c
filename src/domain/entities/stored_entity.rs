use crate::domain::value_objects::{EntityFamily, EntityId};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Family-agnostic row as the local store sees it. The typed entity lives
/// serialized in `body`; the remaining columns are the indexed projections the
/// store queries on.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity {
    pub family: EntityFamily,
    pub id: EntityId,
    pub scope_id: String,
    pub body: Value,
    pub is_synced: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub sort_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredEntity {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

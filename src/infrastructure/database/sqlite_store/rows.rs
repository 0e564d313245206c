use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntityRow {
    pub id: String,
    pub scope_id: String,
    pub payload: String,
    pub is_synced: bool,
    pub last_synced_at: Option<i64>,
    pub sort_at: i64,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingActionRow {
    pub id: i64,
    pub action_type: String,
    pub entity_family: String,
    pub entity_id: String,
    pub idempotency_key: String,
    pub payload: String,
    pub retry_count: i64,
    pub max_retries: i64,
    pub created_at: i64,
    pub last_attempt_at: Option<i64>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct OutboxCountsRow {
    pub retriable: i64,
    pub terminal: i64,
}

use crate::domain::value_objects::{
    ActionPayload, ActionType, EntityFamily, EntityId, IdempotencyKey, PendingActionId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outbox row: a mutation the server has not confirmed yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    pub id: PendingActionId,
    pub action_type: ActionType,
    pub entity_family: EntityFamily,
    pub entity_id: EntityId,
    pub idempotency_key: IdempotencyKey,
    pub payload: ActionPayload,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl PendingAction {
    pub fn is_retriable(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Exhausted actions stay in the table for observability but are never
    /// dispatched again.
    pub fn is_terminal(&self) -> bool {
        !self.is_retriable()
    }

    /// Provisional ids of other records this action's payload points at.
    pub fn dependencies(&self) -> Vec<EntityId> {
        self.payload.foreign_provisional_ids(&self.entity_id)
    }
}

/// Everything needed to insert a new outbox row.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingActionDraft {
    pub action_type: ActionType,
    pub entity_id: EntityId,
    pub idempotency_key: IdempotencyKey,
    pub payload: ActionPayload,
    pub max_retries: u32,
}

impl PendingActionDraft {
    pub fn new(
        action_type: ActionType,
        entity_id: EntityId,
        idempotency_key: IdempotencyKey,
        payload: ActionPayload,
        max_retries: u32,
    ) -> Self {
        Self {
            action_type,
            entity_id,
            idempotency_key,
            payload,
            max_retries,
        }
    }

    pub fn entity_family(&self) -> EntityFamily {
        self.action_type.family()
    }
}

/// Outbox listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingActionFilter {
    pub action_type: Option<ActionType>,
    pub terminal_only: bool,
    pub limit: Option<u32>,
}

/// Row counts used by status surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxCounts {
    pub retriable: u64,
    pub terminal: u64,
}

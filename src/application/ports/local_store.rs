use crate::domain::entities::{
    EntityQuery, OutboxCounts, PendingAction, PendingActionDraft, PendingActionFilter,
    StoredEntity,
};
use crate::domain::value_objects::{EntityFamily, EntityId, PendingActionId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Keyed cache of entity rows, one table per family.
///
/// Every call runs in its own transaction. Nothing is locked between calls.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Replaces the whole row for `entity.id`.
    async fn upsert(&self, entity: StoredEntity) -> Result<(), AppError>;

    /// Write-through of a remote snapshot. Rows that are unsynced locally are
    /// left alone; returns the number of rows written.
    async fn upsert_snapshot(&self, entities: Vec<StoredEntity>) -> Result<u64, AppError>;

    async fn get(
        &self,
        family: EntityFamily,
        id: &EntityId,
    ) -> Result<Option<StoredEntity>, AppError>;

    /// Rows ordered by `sort_at` descending.
    async fn query(
        &self,
        family: EntityFamily,
        query: &EntityQuery,
    ) -> Result<Vec<StoredEntity>, AppError>;

    async fn delete(&self, family: EntityFamily, id: &EntityId) -> Result<bool, AppError>;

    async fn delete_many(&self, family: EntityFamily, ids: &[EntityId]) -> Result<u64, AppError>;

    /// Deletes rows whose `expires_at` is at or before `now`, together with any
    /// outbox rows that still point at them.
    async fn purge_expired(
        &self,
        family: EntityFamily,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;
}

/// Durable queue of mutations the server has not confirmed.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Writes the optimistic row and its outbox entry atomically.
    async fn stage_optimistic(
        &self,
        entity: StoredEntity,
        draft: PendingActionDraft,
    ) -> Result<PendingAction, AppError>;

    async fn get_action(&self, id: PendingActionId) -> Result<Option<PendingAction>, AppError>;

    async fn list_actions(
        &self,
        filter: &PendingActionFilter,
    ) -> Result<Vec<PendingAction>, AppError>;

    /// Actions with attempts left, oldest first.
    async fn list_retriable(&self) -> Result<Vec<PendingAction>, AppError>;

    async fn live_action_for(
        &self,
        entity_id: &EntityId,
    ) -> Result<Option<PendingAction>, AppError>;

    /// Any outbox row for the entity, live ones first.
    async fn action_for(&self, entity_id: &EntityId) -> Result<Option<PendingAction>, AppError>;

    /// Stamps the attempt. `terminal` jumps the counter straight to the
    /// ceiling; otherwise it is bumped by one. Returns the updated row.
    async fn record_failure(
        &self,
        id: PendingActionId,
        attempted_at: DateTime<Utc>,
        error: &str,
        terminal: bool,
    ) -> Result<PendingAction, AppError>;

    /// Stamps `last_error` without consuming an attempt.
    async fn annotate_action(
        &self,
        id: PendingActionId,
        attempted_at: DateTime<Utc>,
        error: &str,
    ) -> Result<(), AppError>;

    /// Confirms an action: removes it, swaps the provisional row for the
    /// canonical one and rewrites references to the provisional id. An action
    /// that is no longer queued leaves the cache untouched.
    async fn settle_action(
        &self,
        action: &PendingAction,
        canonical: StoredEntity,
    ) -> Result<(), AppError>;

    async fn delete_action(&self, id: PendingActionId) -> Result<bool, AppError>;

    /// Gives a terminal action a fresh set of attempts.
    async fn requeue(&self, id: PendingActionId) -> Result<PendingAction, AppError>;

    async fn outbox_counts(&self) -> Result<OutboxCounts, AppError>;
}

pub trait LocalStore: EntityStore + OutboxStore {}

impl<T: EntityStore + OutboxStore> LocalStore for T {}

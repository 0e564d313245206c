use super::mappers::pending_action_from_row;
use super::rows::{OutboxCountsRow, PendingActionRow};
use super::{SqliteSyncStore, queries, remap_references, write_entity};
use crate::application::ports::OutboxStore;
use crate::domain::entities::{
    OutboxCounts, PendingAction, PendingActionDraft, PendingActionFilter, StoredEntity,
};
use crate::domain::value_objects::{EntityId, PendingActionId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

async fn fetch_action(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<PendingAction>, AppError> {
    let row = sqlx::query_as::<_, PendingActionRow>(queries::SELECT_PENDING_ACTION_BY_ID)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(pending_action_from_row).transpose()
}

fn missing(id: PendingActionId) -> AppError {
    AppError::NotFound(format!("pending action {id}"))
}

#[async_trait]
impl OutboxStore for SqliteSyncStore {
    async fn stage_optimistic(
        &self,
        entity: StoredEntity,
        draft: PendingActionDraft,
    ) -> Result<PendingAction, AppError> {
        if entity.family != draft.entity_family() || entity.id != draft.entity_id {
            return Err(AppError::InvalidInput(format!(
                "action {} for {} does not match staged {} row {}",
                draft.action_type,
                draft.entity_id,
                entity.family,
                entity.id
            )));
        }
        let payload = serde_json::to_string(draft.payload.as_json())?;

        // The insert comes first so the transaction holds the write lock
        // before it looks for a competing live action.
        let mut tx = self.pool.get_pool().begin().await?;
        let id = sqlx::query(queries::INSERT_PENDING_ACTION)
            .bind(draft.action_type.as_str())
            .bind(draft.entity_family().as_str())
            .bind(draft.entity_id.as_str())
            .bind(draft.idempotency_key.as_str())
            .bind(payload)
            .bind(i64::from(draft.max_retries))
            .bind(Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        let competing: Option<i64> =
            sqlx::query_scalar(queries::SELECT_OTHER_LIVE_ACTION_FOR_ENTITY)
                .bind(draft.entity_id.as_str())
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if let Some(competing) = competing {
            tracing::debug!(
                target: "feedsync::store",
                entity_id = %draft.entity_id,
                competing_action = competing,
                "rejecting stage while an earlier action is live"
            );
            return Err(AppError::MutationPending(draft.entity_id.to_string()));
        }
        write_entity(&mut tx, &entity, false).await?;
        let action = fetch_action(&mut tx, id).await?.ok_or_else(|| {
            AppError::LocalPersistenceFailure(format!("staged action {id} vanished"))
        })?;
        tx.commit().await?;

        tracing::debug!(
            target: "feedsync::store",
            action_id = %action.id,
            entity_id = %action.entity_id,
            action_type = %action.action_type,
            "optimistic write staged"
        );
        Ok(action)
    }

    async fn get_action(&self, id: PendingActionId) -> Result<Option<PendingAction>, AppError> {
        let mut conn = self.pool.get_pool().acquire().await?;
        fetch_action(&mut conn, id.value()).await
    }

    async fn list_actions(
        &self,
        filter: &PendingActionFilter,
    ) -> Result<Vec<PendingAction>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new(queries::SELECT_PENDING_ACTIONS);
        if let Some(action_type) = filter.action_type {
            builder
                .push(" AND action_type = ")
                .push_bind(action_type.as_str());
        }
        if filter.terminal_only {
            builder.push(" AND retry_count >= max_retries");
        }
        builder.push(" ORDER BY created_at ASC, id ASC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows = builder
            .build_query_as::<PendingActionRow>()
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.into_iter().map(pending_action_from_row).collect()
    }

    async fn list_retriable(&self) -> Result<Vec<PendingAction>, AppError> {
        let rows = sqlx::query_as::<_, PendingActionRow>(queries::SELECT_RETRIABLE_ACTIONS)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.into_iter().map(pending_action_from_row).collect()
    }

    async fn live_action_for(
        &self,
        entity_id: &EntityId,
    ) -> Result<Option<PendingAction>, AppError> {
        let row = sqlx::query_as::<_, PendingActionRow>(queries::SELECT_LIVE_ACTION_FOR_ENTITY)
            .bind(entity_id.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;
        row.map(pending_action_from_row).transpose()
    }

    async fn action_for(&self, entity_id: &EntityId) -> Result<Option<PendingAction>, AppError> {
        let row = sqlx::query_as::<_, PendingActionRow>(queries::SELECT_ACTION_FOR_ENTITY)
            .bind(entity_id.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;
        row.map(pending_action_from_row).transpose()
    }

    async fn record_failure(
        &self,
        id: PendingActionId,
        attempted_at: DateTime<Utc>,
        error: &str,
        terminal: bool,
    ) -> Result<PendingAction, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;
        let updated = sqlx::query(queries::RECORD_ACTION_FAILURE)
            .bind(id.value())
            .bind(attempted_at.timestamp_millis())
            .bind(error)
            .bind(terminal)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(missing(id));
        }
        let action = fetch_action(&mut tx, id.value())
            .await?
            .ok_or_else(|| missing(id))?;
        tx.commit().await?;
        Ok(action)
    }

    async fn annotate_action(
        &self,
        id: PendingActionId,
        attempted_at: DateTime<Utc>,
        error: &str,
    ) -> Result<(), AppError> {
        let updated = sqlx::query(queries::ANNOTATE_ACTION)
            .bind(id.value())
            .bind(attempted_at.timestamp_millis())
            .bind(error)
            .execute(self.pool.get_pool())
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(missing(id));
        }
        Ok(())
    }

    async fn settle_action(
        &self,
        action: &PendingAction,
        canonical: StoredEntity,
    ) -> Result<(), AppError> {
        if canonical.family != action.entity_family {
            return Err(AppError::InvalidInput(format!(
                "cannot settle {} action with a {} row",
                action.entity_family, canonical.family
            )));
        }

        let mut tx = self.pool.get_pool().begin().await?;
        let removed = sqlx::query(queries::DELETE_PENDING_ACTION)
            .bind(action.id.value())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            // Deleted or purged while the replay was in flight; the row it
            // would confirm is gone too.
            tracing::debug!(
                target: "feedsync::store",
                action_id = %action.id,
                entity_id = %action.entity_id,
                server_id = %canonical.id,
                "settled action no longer queued, dropping canonical row"
            );
            return Ok(());
        }

        let mut remapped = 0;
        if canonical.id != action.entity_id {
            sqlx::query(&queries::delete_entity(action.entity_family.table_name()))
                .bind(action.entity_id.as_str())
                .execute(&mut *tx)
                .await?;
            if action.entity_id.is_provisional() {
                remapped = remap_references(&mut tx, &action.entity_id, &canonical.id).await?;
            }
        }
        write_entity(&mut tx, &canonical, false).await?;
        tx.commit().await?;

        if canonical.id != action.entity_id {
            tracing::debug!(
                target: "feedsync::store",
                action_id = %action.id,
                from = %action.entity_id,
                to = %canonical.id,
                references = remapped,
                "provisional id remapped"
            );
        }
        Ok(())
    }

    async fn delete_action(&self, id: PendingActionId) -> Result<bool, AppError> {
        let result = sqlx::query(queries::DELETE_PENDING_ACTION)
            .bind(id.value())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn requeue(&self, id: PendingActionId) -> Result<PendingAction, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;
        let updated = sqlx::query(queries::REQUEUE_ACTION)
            .bind(id.value())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(missing(id));
        }
        let action = fetch_action(&mut tx, id.value())
            .await?
            .ok_or_else(|| missing(id))?;
        tx.commit().await?;

        tracing::info!(
            target: "feedsync::store",
            action_id = %action.id,
            "pending action requeued"
        );
        Ok(action)
    }

    async fn outbox_counts(&self) -> Result<OutboxCounts, AppError> {
        let row = sqlx::query_as::<_, OutboxCountsRow>(queries::COUNT_OUTBOX)
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(OutboxCounts {
            retriable: row.retriable.max(0) as u64,
            terminal: row.terminal.max(0) as u64,
        })
    }
}

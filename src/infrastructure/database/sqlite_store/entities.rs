use super::mappers::stored_entity_from_row;
use super::rows::EntityRow;
use super::{SqliteSyncStore, delete_entity_row, queries, write_entity};
use crate::application::ports::EntityStore;
use crate::domain::entities::{EntityQuery, StoredEntity};
use crate::domain::value_objects::{EntityFamily, EntityId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

#[async_trait]
impl EntityStore for SqliteSyncStore {
    async fn upsert(&self, entity: StoredEntity) -> Result<(), AppError> {
        let mut conn = self.pool.get_pool().acquire().await?;
        write_entity(&mut conn, &entity, false).await?;
        Ok(())
    }

    async fn upsert_snapshot(&self, entities: Vec<StoredEntity>) -> Result<u64, AppError> {
        if entities.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.get_pool().begin().await?;
        let mut written = 0;
        for entity in &entities {
            written += write_entity(&mut tx, entity, true).await?;
        }
        tx.commit().await?;

        let skipped = entities.len() as u64 - written;
        if skipped > 0 {
            tracing::debug!(
                target: "feedsync::store",
                skipped,
                "kept unsynced local rows over snapshot copies"
            );
        }
        Ok(written)
    }

    async fn get(
        &self,
        family: EntityFamily,
        id: &EntityId,
    ) -> Result<Option<StoredEntity>, AppError> {
        let row = sqlx::query_as::<_, EntityRow>(&queries::select_entity_by_id(
            family.table_name(),
        ))
        .bind(id.as_str())
        .fetch_optional(self.pool.get_pool())
        .await?;

        row.map(|row| stored_entity_from_row(family, row))
            .transpose()
    }

    async fn query(
        &self,
        family: EntityFamily,
        query: &EntityQuery,
    ) -> Result<Vec<StoredEntity>, AppError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(queries::select_entities(family.table_name()));
        if let Some(scope_id) = &query.scope_id {
            builder.push(" AND scope_id = ").push_bind(scope_id.clone());
        }
        if query.unsynced_only {
            builder.push(" AND is_synced = 0");
        }
        if !query.include_expired {
            builder
                .push(" AND (expires_at IS NULL OR expires_at > ")
                .push_bind(Utc::now().timestamp_millis())
                .push(")");
        }
        builder.push(" ORDER BY sort_at DESC, id ASC");
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows = builder
            .build_query_as::<EntityRow>()
            .fetch_all(self.pool.get_pool())
            .await?;

        rows.into_iter()
            .map(|row| stored_entity_from_row(family, row))
            .collect()
    }

    async fn delete(&self, family: EntityFamily, id: &EntityId) -> Result<bool, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;
        let deleted = delete_entity_row(&mut tx, family, id).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn delete_many(&self, family: EntityFamily, ids: &[EntityId]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.get_pool().begin().await?;
        let mut deleted = 0;
        for id in ids {
            if delete_entity_row(&mut tx, family, id).await? {
                deleted += 1;
            }
        }
        tx.commit().await?;
        Ok(deleted)
    }

    async fn purge_expired(
        &self,
        family: EntityFamily,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let table = family.table_name();
        let now_ms = now.timestamp_millis();

        let mut tx = self.pool.get_pool().begin().await?;
        let cancelled = sqlx::query(&queries::delete_expired_actions(table))
            .bind(family.as_str())
            .bind(now_ms)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let purged = sqlx::query(&queries::delete_expired_entities(table))
            .bind(now_ms)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        if purged > 0 {
            tracing::info!(
                target: "feedsync::store",
                family = %family,
                purged,
                cancelled_actions = cancelled,
                "expired rows purged"
            );
        }
        Ok(purged)
    }
}

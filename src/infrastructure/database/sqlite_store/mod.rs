//! SQLite-backed entity cache and outbox.

mod entities;
mod mappers;
mod outbox;
mod queries;
mod rows;

use super::connection_pool::ConnectionPool;
use crate::domain::entities::StoredEntity;
use crate::domain::value_objects::{EntityFamily, EntityId};
use crate::shared::error::AppError;
use sqlx::SqliteConnection;

/// Implements both `EntityStore` and `OutboxStore` over one pool so that an
/// optimistic write and its outbox row can share a transaction.
#[derive(Clone)]
pub struct SqliteSyncStore {
    pool: ConnectionPool,
}

impl SqliteSyncStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

async fn write_entity(
    conn: &mut SqliteConnection,
    entity: &StoredEntity,
    skip_unsynced: bool,
) -> Result<u64, AppError> {
    let table = entity.family.table_name();
    let sql = if skip_unsynced {
        queries::upsert_entity_if_synced(table)
    } else {
        queries::upsert_entity(table)
    };
    let body = serde_json::to_string(&entity.body)?;

    let result = sqlx::query(&sql)
        .bind(entity.id.as_str())
        .bind(&entity.scope_id)
        .bind(body)
        .bind(entity.is_synced)
        .bind(entity.last_synced_at.map(|at| at.timestamp_millis()))
        .bind(entity.sort_at.timestamp_millis())
        .bind(entity.expires_at.map(|at| at.timestamp_millis()))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

async fn delete_entity_row(
    conn: &mut SqliteConnection,
    family: EntityFamily,
    id: &EntityId,
) -> Result<bool, AppError> {
    sqlx::query(queries::DELETE_ACTIONS_FOR_ENTITY)
        .bind(family.as_str())
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query(&queries::delete_entity(family.table_name()))
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Replaces a provisional id everywhere it is referenced: entity scope
/// columns, serialized bodies and outbox rows.
async fn remap_references(
    conn: &mut SqliteConnection,
    from: &EntityId,
    to: &EntityId,
) -> Result<u64, AppError> {
    let mut touched = 0;
    for family in EntityFamily::ALL {
        let result = sqlx::query(&queries::remap_entity_references(family.table_name()))
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&mut *conn)
            .await?;
        touched += result.rows_affected();
    }
    let result = sqlx::query(queries::REMAP_ACTION_REFERENCES)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(touched + result.rows_affected())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) async fn memory_store() -> SqliteSyncStore {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.migrate().await.unwrap();
        SqliteSyncStore::new(pool)
    }
}

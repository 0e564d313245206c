use super::rows::{EntityRow, PendingActionRow};
use crate::domain::entities::{PendingAction, StoredEntity};
use crate::domain::value_objects::{
    ActionPayload, ActionType, EntityFamily, EntityId, IdempotencyKey, PendingActionId,
};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};

pub(super) fn stored_entity_from_row(
    family: EntityFamily,
    row: EntityRow,
) -> Result<StoredEntity, AppError> {
    Ok(StoredEntity {
        family,
        id: EntityId::new(row.id).map_err(AppError::LocalPersistenceFailure)?,
        scope_id: row.scope_id,
        body: serde_json::from_str(&row.payload)?,
        is_synced: row.is_synced,
        last_synced_at: row.last_synced_at.map(timestamp_from_millis).transpose()?,
        sort_at: timestamp_from_millis(row.sort_at)?,
        expires_at: row.expires_at.map(timestamp_from_millis).transpose()?,
    })
}

pub(super) fn pending_action_from_row(row: PendingActionRow) -> Result<PendingAction, AppError> {
    Ok(PendingAction {
        id: PendingActionId::new(row.id).map_err(AppError::LocalPersistenceFailure)?,
        action_type: ActionType::parse(&row.action_type)
            .map_err(AppError::LocalPersistenceFailure)?,
        entity_family: EntityFamily::parse(&row.entity_family)
            .map_err(AppError::LocalPersistenceFailure)?,
        entity_id: EntityId::new(row.entity_id).map_err(AppError::LocalPersistenceFailure)?,
        idempotency_key: IdempotencyKey::new(row.idempotency_key)
            .map_err(AppError::LocalPersistenceFailure)?,
        payload: ActionPayload::from_json_str(&row.payload)
            .map_err(AppError::LocalPersistenceFailure)?,
        retry_count: to_u32(row.retry_count, "retry_count")?,
        max_retries: to_u32(row.max_retries, "max_retries")?,
        created_at: timestamp_from_millis(row.created_at)?,
        last_attempt_at: row.last_attempt_at.map(timestamp_from_millis).transpose()?,
        last_error: row.last_error,
    })
}

pub(super) fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        AppError::LocalPersistenceFailure(format!("timestamp out of range: {millis}"))
    })
}

fn to_u32(value: i64, column: &str) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::LocalPersistenceFailure(format!("{column} out of range: {value}")))
}

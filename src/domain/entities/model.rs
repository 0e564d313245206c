use super::{StoredEntity, SyncMeta};
use crate::domain::value_objects::{ActionType, EntityFamily, EntityId};
use crate::shared::error::AppError;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

/// A cached domain record belonging to one entity family.
pub trait EntityModel: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    const FAMILY: EntityFamily;

    fn id(&self) -> &EntityId;
    fn set_id(&mut self, id: EntityId);

    /// Column the family is usually queried by (author, conversation, post...).
    fn scope_id(&self) -> &str;

    /// Timestamp the family is ordered by.
    fn sort_at(&self) -> DateTime<Utc>;

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn sync(&self) -> &SyncMeta;
    fn sync_mut(&mut self) -> &mut SyncMeta;

    fn to_stored(&self) -> Result<StoredEntity, AppError> {
        Ok(StoredEntity {
            family: Self::FAMILY,
            id: self.id().clone(),
            scope_id: self.scope_id().to_string(),
            body: serde_json::to_value(self)?,
            is_synced: self.sync().is_synced,
            last_synced_at: self.sync().last_synced_at,
            sort_at: self.sort_at(),
            expires_at: self.expires_at(),
        })
    }

    /// Columns win over whatever the serialized body says about identity and
    /// sync state.
    fn from_stored(stored: StoredEntity) -> Result<Self, AppError> {
        if stored.family != Self::FAMILY {
            return Err(AppError::LocalPersistenceFailure(format!(
                "expected {} row, found {}",
                Self::FAMILY,
                stored.family
            )));
        }
        let mut entity: Self = serde_json::from_value(stored.body)?;
        entity.set_id(stored.id);
        *entity.sync_mut() = SyncMeta {
            is_synced: stored.is_synced,
            last_synced_at: stored.last_synced_at,
        };
        Ok(entity)
    }
}

/// Inputs available when a mutation is turned into its optimistic record.
#[derive(Debug, Clone, Copy)]
pub struct OptimisticContext {
    pub now: DateTime<Utc>,
    pub story_ttl: Duration,
}

/// Parameters of a write against one entity family. Serialized verbatim into
/// the outbox payload, so it must carry everything needed to replay the call.
pub trait MutationModel: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Entity: EntityModel;

    fn action_type(&self) -> ActionType;

    /// Existing record the mutation modifies. `None` for creations, which get a
    /// provisional id instead.
    fn target_id(&self) -> Option<&EntityId> {
        None
    }

    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }

    /// Local stand-in for the record the server will eventually return.
    fn build_optimistic(
        &self,
        id: EntityId,
        existing: Option<Self::Entity>,
        ctx: OptimisticContext,
    ) -> Result<Self::Entity, AppError>;
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

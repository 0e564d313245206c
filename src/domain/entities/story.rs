use super::model::{EntityModel, MutationModel, OptimisticContext, require_text};
use super::SyncMeta;
use crate::domain::reconciliation::EphemeralItem;
use crate::domain::value_objects::{ActionType, EntityFamily, EntityId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short-lived media item. Invisible once `expires_at` has passed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: EntityId,
    pub author_id: String,
    pub media_url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub sync: SyncMeta,
}

impl Story {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl EntityModel for Story {
    const FAMILY: EntityFamily = EntityFamily::Story;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn scope_id(&self) -> &str {
        &self.author_id
    }

    fn sort_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        Some(self.expires_at)
    }

    fn sync(&self) -> &SyncMeta {
        &self.sync
    }

    fn sync_mut(&mut self) -> &mut SyncMeta {
        &mut self.sync
    }
}

impl EphemeralItem for Story {
    fn item_id(&self) -> &str {
        self.id.as_str()
    }

    fn author_id(&self) -> &str {
        &self.author_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn expiry(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadStory {
    pub author_id: String,
    pub media_url: String,
}

impl MutationModel for UploadStory {
    type Entity = Story;

    fn action_type(&self) -> ActionType {
        ActionType::UploadStory
    }

    fn validate(&self) -> Result<(), AppError> {
        require_text("authorId", &self.author_id)?;
        require_text("mediaUrl", &self.media_url)
    }

    fn build_optimistic(
        &self,
        id: EntityId,
        _existing: Option<Story>,
        ctx: OptimisticContext,
    ) -> Result<Story, AppError> {
        Ok(Story {
            id,
            author_id: self.author_id.clone(),
            media_url: self.media_url.clone(),
            created_at: ctx.now,
            expires_at: ctx.now + ctx.story_ttl,
            sync: SyncMeta::pending(),
        })
    }
}

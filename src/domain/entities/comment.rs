use super::model::{EntityModel, MutationModel, OptimisticContext, require_text};
use super::SyncMeta;
use crate::domain::value_objects::{ActionType, EntityFamily, EntityId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: EntityId,
    pub post_id: EntityId,
    pub author_id: String,
    pub body: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sync: SyncMeta,
}

impl EntityModel for Comment {
    const FAMILY: EntityFamily = EntityFamily::Comment;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn scope_id(&self) -> &str {
        self.post_id.as_str()
    }

    fn sort_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn sync(&self) -> &SyncMeta {
        &self.sync
    }

    fn sync_mut(&mut self) -> &mut SyncMeta {
        &mut self.sync
    }
}

/// A comment may point at a post that is itself still provisional; the outbox
/// holds it back until that post has been confirmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddComment {
    pub post_id: EntityId,
    pub author_id: String,
    pub body: String,
}

impl MutationModel for AddComment {
    type Entity = Comment;

    fn action_type(&self) -> ActionType {
        ActionType::AddComment
    }

    fn validate(&self) -> Result<(), AppError> {
        require_text("authorId", &self.author_id)?;
        require_text("body", &self.body)
    }

    fn build_optimistic(
        &self,
        id: EntityId,
        _existing: Option<Comment>,
        ctx: OptimisticContext,
    ) -> Result<Comment, AppError> {
        Ok(Comment {
            id,
            post_id: self.post_id.clone(),
            author_id: self.author_id.clone(),
            body: self.body.trim().to_string(),
            created_at: ctx.now,
            sync: SyncMeta::pending(),
        })
    }
}

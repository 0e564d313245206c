use super::model::{EntityModel, MutationModel, OptimisticContext, require_text};
use super::SyncMeta;
use crate::domain::value_objects::{ActionType, EntityFamily, EntityId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: EntityId,
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sync: SyncMeta,
}

impl EntityModel for Message {
    const FAMILY: EntityFamily = EntityFamily::Message;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn scope_id(&self) -> &str {
        &self.conversation_id
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

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
}

impl MutationModel for SendMessage {
    type Entity = Message;

    fn action_type(&self) -> ActionType {
        ActionType::SendMessage
    }

    fn validate(&self) -> Result<(), AppError> {
        require_text("conversationId", &self.conversation_id)?;
        require_text("recipientId", &self.recipient_id)?;
        require_text("body", &self.body)
    }

    fn build_optimistic(
        &self,
        id: EntityId,
        _existing: Option<Message>,
        ctx: OptimisticContext,
    ) -> Result<Message, AppError> {
        Ok(Message {
            id,
            conversation_id: self.conversation_id.clone(),
            sender_id: self.sender_id.clone(),
            recipient_id: self.recipient_id.clone(),
            body: self.body.trim().to_string(),
            created_at: ctx.now,
            sync: SyncMeta::pending(),
        })
    }
}

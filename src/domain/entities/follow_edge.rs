use super::model::{EntityModel, MutationModel, OptimisticContext, require_text};
use super::SyncMeta;
use crate::domain::value_objects::{ActionType, EntityFamily, EntityId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowStatus {
    Requested,
    Accepted,
}

impl FollowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowStatus::Requested => "requested",
            FollowStatus::Accepted => "accepted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub id: EntityId,
    pub follower_id: String,
    pub followee_id: String,
    pub status: FollowStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sync: SyncMeta,
}

impl EntityModel for FollowEdge {
    const FAMILY: EntityFamily = EntityFamily::FollowEdge;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn scope_id(&self) -> &str {
        &self.follower_id
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
pub struct FollowRequest {
    pub follower_id: String,
    pub followee_id: String,
}

impl MutationModel for FollowRequest {
    type Entity = FollowEdge;

    fn action_type(&self) -> ActionType {
        ActionType::FollowRequest
    }

    fn validate(&self) -> Result<(), AppError> {
        require_text("followerId", &self.follower_id)?;
        require_text("followeeId", &self.followee_id)?;
        if self.follower_id == self.followee_id {
            return Err(AppError::InvalidInput("Cannot follow yourself".to_string()));
        }
        Ok(())
    }

    fn build_optimistic(
        &self,
        id: EntityId,
        _existing: Option<FollowEdge>,
        ctx: OptimisticContext,
    ) -> Result<FollowEdge, AppError> {
        Ok(FollowEdge {
            id,
            follower_id: self.follower_id.clone(),
            followee_id: self.followee_id.clone(),
            status: FollowStatus::Requested,
            created_at: ctx.now,
            sync: SyncMeta::pending(),
        })
    }
}

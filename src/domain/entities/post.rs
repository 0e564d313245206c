use super::model::{EntityModel, MutationModel, OptimisticContext, require_text};
use super::SyncMeta;
use crate::domain::value_objects::{ActionType, EntityFamily, EntityId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: EntityId,
    pub author_id: String,
    pub caption: String,
    pub media_url: Option<String>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked_by_me: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sync: SyncMeta,
}

impl EntityModel for Post {
    const FAMILY: EntityFamily = EntityFamily::Post;

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

    fn sync(&self) -> &SyncMeta {
        &self.sync
    }

    fn sync_mut(&mut self) -> &mut SyncMeta {
        &mut self.sync
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadPost {
    pub author_id: String,
    pub caption: String,
    pub media_url: Option<String>,
}

/// Sets the like state rather than flipping it, so a replayed request lands on
/// the same result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub post_id: EntityId,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostMutation {
    Upload(UploadPost),
    Like(LikeToggle),
}

impl MutationModel for PostMutation {
    type Entity = Post;

    fn action_type(&self) -> ActionType {
        match self {
            PostMutation::Upload(_) => ActionType::UploadPost,
            PostMutation::Like(_) => ActionType::LikeToggle,
        }
    }

    fn target_id(&self) -> Option<&EntityId> {
        match self {
            PostMutation::Upload(_) => None,
            PostMutation::Like(like) => Some(&like.post_id),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        match self {
            PostMutation::Upload(upload) => {
                require_text("authorId", &upload.author_id)?;
                if upload.caption.trim().is_empty() && upload.media_url.is_none() {
                    return Err(AppError::InvalidInput(
                        "A post needs a caption or media".to_string(),
                    ));
                }
                Ok(())
            }
            PostMutation::Like(_) => Ok(()),
        }
    }

    fn build_optimistic(
        &self,
        id: EntityId,
        existing: Option<Post>,
        ctx: OptimisticContext,
    ) -> Result<Post, AppError> {
        match self {
            PostMutation::Upload(upload) => Ok(Post {
                id,
                author_id: upload.author_id.clone(),
                caption: upload.caption.trim().to_string(),
                media_url: upload.media_url.clone(),
                like_count: 0,
                liked_by_me: false,
                created_at: ctx.now,
                sync: SyncMeta::pending(),
            }),
            PostMutation::Like(like) => {
                let mut post = existing.ok_or_else(|| {
                    AppError::NotFound(format!("post {} is not cached", like.post_id))
                })?;
                if post.liked_by_me != like.liked {
                    post.like_count = if like.liked {
                        post.like_count.saturating_add(1)
                    } else {
                        post.like_count.saturating_sub(1)
                    };
                    post.liked_by_me = like.liked;
                }
                post.sync.mark_pending();
                Ok(post)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ctx() -> OptimisticContext {
        OptimisticContext {
            now: Utc::now(),
            story_ttl: Duration::hours(24),
        }
    }

    fn cached_post(liked: bool, likes: u32) -> Post {
        Post {
            id: EntityId::parse("post_1").unwrap(),
            author_id: "alice".into(),
            caption: "sunset".into(),
            media_url: None,
            like_count: likes,
            liked_by_me: liked,
            created_at: Utc::now(),
            sync: SyncMeta::synced_at(Utc::now()),
        }
    }

    #[test]
    fn like_adjusts_count_only_on_state_change() {
        let like = PostMutation::Like(LikeToggle {
            post_id: EntityId::parse("post_1").unwrap(),
            liked: true,
        });

        let liked = like
            .build_optimistic(
                EntityId::parse("post_1").unwrap(),
                Some(cached_post(false, 4)),
                ctx(),
            )
            .unwrap();
        assert_eq!(liked.like_count, 5);
        assert!(liked.liked_by_me);
        assert!(!liked.sync.is_synced);

        let unchanged = like
            .build_optimistic(
                EntityId::parse("post_1").unwrap(),
                Some(cached_post(true, 5)),
                ctx(),
            )
            .unwrap();
        assert_eq!(unchanged.like_count, 5);
    }

    #[test]
    fn like_requires_cached_post() {
        let like = PostMutation::Like(LikeToggle {
            post_id: EntityId::parse("post_9").unwrap(),
            liked: true,
        });
        let err = like
            .build_optimistic(EntityId::parse("post_9").unwrap(), None, ctx())
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn empty_upload_is_rejected() {
        let upload = PostMutation::Upload(UploadPost {
            author_id: "alice".into(),
            caption: "   ".into(),
            media_url: None,
        });
        assert!(upload.validate().is_err());
    }
}

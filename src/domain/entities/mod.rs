pub mod comment;
pub mod follow_edge;
pub mod message;
pub mod model;
pub mod pending_action;
pub mod post;
pub mod query;
pub mod stored_entity;
pub mod story;
pub mod sync_meta;

pub use comment::{AddComment, Comment};
pub use follow_edge::{FollowEdge, FollowRequest, FollowStatus};
pub use message::{Message, SendMessage};
pub use model::{EntityModel, MutationModel, OptimisticContext};
pub use pending_action::{OutboxCounts, PendingAction, PendingActionDraft, PendingActionFilter};
pub use post::{LikeToggle, Post, PostMutation, UploadPost};
pub use query::EntityQuery;
pub use stored_entity::StoredEntity;
pub use story::{Story, UploadStory};
pub use sync_meta::SyncMeta;

use crate::domain::entities::PendingAction;
use crate::domain::value_objects::ActionType;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Re-executes a queued action against the backend and settles it locally.
#[async_trait]
pub trait ActionReplayer: Send + Sync {
    fn action_types(&self) -> Vec<ActionType>;

    async fn replay(&self, action: &PendingAction) -> Result<(), AppError>;
}

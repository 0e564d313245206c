use super::SyncRepository;
use crate::application::ports::ActionReplayer;
use crate::domain::entities::{EntityModel, MutationModel, PendingAction, SyncMeta};
use crate::domain::value_objects::ActionType;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl<M: MutationModel> ActionReplayer for SyncRepository<M> {
    fn action_types(&self) -> Vec<ActionType> {
        ActionType::ALL
            .iter()
            .copied()
            .filter(|action_type| action_type.family() == Self::family())
            .collect()
    }

    async fn replay(&self, action: &PendingAction) -> Result<(), AppError> {
        let mutation: M = action.payload.mutation().map_err(AppError::InvalidInput)?;
        let mut entity = self
            .remote
            .submit(&mutation, &action.idempotency_key)
            .await?;
        *entity.sync_mut() = SyncMeta::synced_at(Utc::now());

        let canonical = entity.to_stored()?;
        let remapped = canonical.id != action.entity_id;
        self.store.settle_action(action, canonical).await?;

        tracing::info!(
            target: "feedsync::repository",
            action_id = %action.id,
            entity_id = %action.entity_id,
            server_id = %entity.id(),
            remapped,
            "pending action confirmed"
        );
        Ok(())
    }
}

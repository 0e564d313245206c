//! Cache-first repository shared by every entity family.
//!
//! Writes go to the backend when possible and fall back to an optimistic
//! local record plus an outbox entry. Reads prefer a fresh snapshot and fall
//! back to the cache.

mod replay;
mod story_feed;

#[cfg(test)]
mod tests;

pub use story_feed::{StoryFeed, StoryRepository};

use crate::application::ports::{ConnectivityMonitor, LocalStore, RemoteGateway};
use crate::application::services::fetch_sequencer::FetchSequencer;
use crate::domain::entities::{
    EntityModel, EntityQuery, MutationModel, OptimisticContext, PendingAction,
    PendingActionDraft, SyncMeta,
};
use crate::domain::value_objects::{ActionPayload, EntityFamily, EntityId, IdempotencyKey};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Result of a write. Remote failures never surface here; they turn the write
/// into a queued one.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<E> {
    Synced(E),
    Queued {
        entity: E,
        action: PendingAction,
        reason: AppError,
    },
}

impl<E> WriteOutcome<E> {
    pub fn entity(&self) -> &E {
        match self {
            WriteOutcome::Synced(entity) => entity,
            WriteOutcome::Queued { entity, .. } => entity,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, WriteOutcome::Synced(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Freshness {
    Fresh,
    Stale { reason: AppError },
    /// A newer fetch of the same view landed first; this one was dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome<E> {
    pub items: Vec<E>,
    pub freshness: Freshness,
}

impl<E> ReadOutcome<E> {
    pub fn is_fresh(&self) -> bool {
        matches!(self.freshness, Freshness::Fresh)
    }
}

/// What became of a remote snapshot.
pub(crate) enum SnapshotPull<E> {
    /// Written through; carries the live (non-expired) remote items.
    Applied(Vec<E>),
    Stale(AppError),
    Superseded,
}

pub struct SyncRepository<M: MutationModel> {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteGateway<M>>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    sequencer: FetchSequencer,
    max_retries: u32,
    story_ttl: Duration,
}

impl<M: MutationModel> SyncRepository<M> {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteGateway<M>>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            sequencer: FetchSequencer::new(),
            max_retries: config.sync.max_retries,
            story_ttl: config.story_ttl(),
        }
    }

    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    fn family() -> EntityFamily {
        <M::Entity as EntityModel>::FAMILY
    }

    pub async fn write(&self, mutation: M) -> Result<WriteOutcome<M::Entity>, AppError> {
        mutation.validate()?;

        let existing = match mutation.target_id() {
            Some(target) => {
                if let Some(action) = self.store.live_action_for(target).await? {
                    tracing::debug!(
                        target: "feedsync::repository",
                        entity_id = %target,
                        action_id = %action.id,
                        "rejecting write while an earlier one is queued"
                    );
                    return Err(AppError::MutationPending(target.to_string()));
                }
                if target.is_provisional() {
                    // Its create is exhausted or gone, so no server id will
                    // ever replace it.
                    return Err(AppError::InvalidInput(format!(
                        "{target} was never confirmed by the server"
                    )));
                }
                self.cached(target).await?
            }
            None => None,
        };

        let key = IdempotencyKey::generate();
        let reason = if self.connectivity.is_online().await {
            match self.remote.submit(&mutation, &key).await {
                Ok(mut entity) => {
                    *entity.sync_mut() = SyncMeta::synced_at(Utc::now());
                    self.store.upsert(entity.to_stored()?).await?;
                    return Ok(WriteOutcome::Synced(entity));
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => err,
            }
        } else {
            AppError::NoConnectivity
        };

        self.queue(mutation, existing, key, reason).await
    }

    async fn queue(
        &self,
        mutation: M,
        existing: Option<M::Entity>,
        key: IdempotencyKey,
        reason: AppError,
    ) -> Result<WriteOutcome<M::Entity>, AppError> {
        let id = mutation
            .target_id()
            .cloned()
            .unwrap_or_else(EntityId::provisional);
        let ctx = OptimisticContext {
            now: Utc::now(),
            story_ttl: self.story_ttl,
        };
        let entity = mutation.build_optimistic(id.clone(), existing, ctx)?;
        let payload = ActionPayload::wrap(&mutation, &id).map_err(AppError::InvalidInput)?;
        let draft = PendingActionDraft::new(
            mutation.action_type(),
            id,
            key,
            payload,
            self.max_retries,
        );
        let action = self.store.stage_optimistic(entity.to_stored()?, draft).await?;

        tracing::info!(
            target: "feedsync::repository",
            action_id = %action.id,
            entity_id = %action.entity_id,
            action_type = %action.action_type,
            reason = %reason,
            "write queued for later dispatch"
        );

        Ok(WriteOutcome::Queued {
            entity,
            action,
            reason,
        })
    }

    pub async fn read(&self, query: &EntityQuery) -> Result<ReadOutcome<M::Entity>, AppError> {
        let freshness = match self.pull_snapshot(query).await? {
            SnapshotPull::Applied(_) => Freshness::Fresh,
            SnapshotPull::Stale(reason) => Freshness::Stale { reason },
            SnapshotPull::Superseded => Freshness::Superseded,
        };
        let items = self.cached_view(query).await?;
        Ok(ReadOutcome { items, freshness })
    }

    /// Cached records only, including optimistic ones.
    pub async fn cached_view(&self, query: &EntityQuery) -> Result<Vec<M::Entity>, AppError> {
        self.store
            .query(Self::family(), query)
            .await?
            .into_iter()
            .map(<M::Entity as EntityModel>::from_stored)
            .collect()
    }

    pub async fn cached(&self, id: &EntityId) -> Result<Option<M::Entity>, AppError> {
        self.store
            .get(Self::family(), id)
            .await?
            .map(<M::Entity as EntityModel>::from_stored)
            .transpose()
    }

    pub(crate) async fn pull_snapshot(
        &self,
        query: &EntityQuery,
    ) -> Result<SnapshotPull<M::Entity>, AppError> {
        if !self.connectivity.is_online().await {
            return Ok(SnapshotPull::Stale(AppError::NoConnectivity));
        }

        let family = Self::family();
        let ticket = self.sequencer.begin(query.sequence_key());
        let fetched = match self.remote.fetch(query).await {
            Ok(items) => items,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                tracing::debug!(
                    target: "feedsync::repository",
                    family = %family,
                    error = %err,
                    "snapshot fetch failed, serving cache"
                );
                return Ok(SnapshotPull::Stale(err));
            }
        };

        let Some(_applied) = self.sequencer.admit(&ticket).await else {
            tracing::debug!(
                target: "feedsync::repository",
                family = %family,
                sequence = ticket.sequence(),
                "discarding superseded snapshot"
            );
            return Ok(SnapshotPull::Superseded);
        };

        let now = Utc::now();
        let mut live = Vec::with_capacity(fetched.len());
        let mut expired = Vec::new();
        for mut entity in fetched {
            if entity.expires_at().is_some_and(|at| at <= now) {
                expired.push(entity.id().clone());
                continue;
            }
            *entity.sync_mut() = SyncMeta::synced_at(now);
            live.push(entity);
        }

        if !expired.is_empty() {
            self.store
                .delete_many(family, &expired)
                .await?;
        }
        let rows = live
            .iter()
            .map(<M::Entity as EntityModel>::to_stored)
            .collect::<Result<Vec<_>, _>>()?;
        let written = self.store.upsert_snapshot(rows).await?;

        tracing::debug!(
            target: "feedsync::repository",
            family = %family,
            written,
            dropped_expired = expired.len(),
            "snapshot applied"
        );

        Ok(SnapshotPull::Applied(live))
    }
}

use super::{Freshness, SnapshotPull, SyncRepository, WriteOutcome};
use crate::domain::entities::{EntityModel, EntityQuery, Story, UploadStory};
use crate::domain::reconciliation::{FeedEntry, ReconciliationEngine};
use crate::domain::value_objects::{EntityFamily, EntityId};
use crate::shared::error::AppError;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

/// Merged story tray as shown to `self_author`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryFeed {
    pub entries: Vec<FeedEntry<Story>>,
    pub freshness: Freshness,
}

/// Story flavour of the repository: same write path, but reads go through the
/// ephemeral merge.
pub struct StoryRepository {
    inner: Arc<SyncRepository<UploadStory>>,
}

impl StoryRepository {
    pub fn new(inner: Arc<SyncRepository<UploadStory>>) -> Self {
        Self { inner }
    }

    pub fn repository(&self) -> &Arc<SyncRepository<UploadStory>> {
        &self.inner
    }

    pub async fn upload(&self, upload: UploadStory) -> Result<WriteOutcome<Story>, AppError> {
        self.inner.write(upload).await
    }

    pub async fn read_feed(&self, self_author: &str) -> Result<StoryFeed, AppError> {
        let query = EntityQuery::all();
        let (candidates, freshness) = match self.inner.pull_snapshot(&query).await? {
            SnapshotPull::Applied(remote) => {
                let own_pending = self
                    .inner
                    .cached_view(&EntityQuery {
                        unsynced_only: true,
                        ..EntityQuery::scoped(self_author)
                    })
                    .await?;
                (with_local(remote, own_pending), Freshness::Fresh)
            }
            SnapshotPull::Stale(reason) => (
                self.inner.cached_view(&query).await?,
                Freshness::Stale { reason },
            ),
            SnapshotPull::Superseded => (
                self.inner.cached_view(&query).await?,
                Freshness::Superseded,
            ),
        };

        let now = Utc::now();
        let outcome = ReconciliationEngine::merge(candidates, self_author, now);

        let store = self.inner.store();
        if !outcome.expired_ids.is_empty() {
            let ids = outcome
                .expired_ids
                .iter()
                .map(|id| EntityId::parse(id).map_err(AppError::InvalidInput))
                .collect::<Result<Vec<_>, _>>()?;
            store.delete_many(EntityFamily::Story, &ids).await?;
        }
        let swept = store.purge_expired(EntityFamily::Story, now).await?;

        tracing::debug!(
            target: "feedsync::repository",
            self_author,
            entries = outcome.entries.len(),
            expired = outcome.expired_ids.len(),
            swept,
            "story feed merged"
        );

        Ok(StoryFeed {
            entries: outcome.entries,
            freshness,
        })
    }
}

// Local optimistic rows shadow a remote copy with the same id.
fn with_local(remote: Vec<Story>, local: Vec<Story>) -> Vec<Story> {
    let local_ids: HashSet<EntityId> = local.iter().map(|story| story.id().clone()).collect();
    remote
        .into_iter()
        .filter(|story| !local_ids.contains(story.id()))
        .chain(local)
        .collect()
}

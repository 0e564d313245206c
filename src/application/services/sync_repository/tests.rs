use super::*;
use crate::application::ports::{EntityStore, OutboxStore};
use crate::domain::entities::{
    LikeToggle, Message, PendingActionFilter, Post, PostMutation, SendMessage, UploadPost,
};
use crate::infrastructure::database::sqlite_store::test_support::memory_store;
use async_trait::async_trait;
use mockall::mock;
use std::sync::Mutex as StdMutex;

mock! {
    pub Remote {}

    #[async_trait]
    impl RemoteGateway<SendMessage> for Remote {
        async fn submit(
            &self,
            mutation: &SendMessage,
            key: &IdempotencyKey,
        ) -> Result<Message, AppError>;

        async fn fetch(&self, query: &EntityQuery) -> Result<Vec<Message>, AppError>;
    }
}

mock! {
    pub PostRemote {}

    #[async_trait]
    impl RemoteGateway<PostMutation> for PostRemote {
        async fn submit(
            &self,
            mutation: &PostMutation,
            key: &IdempotencyKey,
        ) -> Result<Post, AppError>;

        async fn fetch(&self, query: &EntityQuery) -> Result<Vec<Post>, AppError>;
    }
}

mock! {
    pub Connectivity {}

    #[async_trait]
    impl ConnectivityMonitor for Connectivity {
        async fn is_online(&self) -> bool;
    }
}

fn connectivity(online: bool) -> Arc<MockConnectivity> {
    let mut monitor = MockConnectivity::new();
    monitor.expect_is_online().returning(move || online);
    Arc::new(monitor)
}

fn send(body: &str) -> SendMessage {
    SendMessage {
        conversation_id: "conv_1".into(),
        sender_id: "alice".into(),
        recipient_id: "bob".into(),
        body: body.into(),
    }
}

fn server_message(id: &str, body: &str) -> Message {
    Message {
        id: EntityId::parse(id).unwrap(),
        conversation_id: "conv_1".into(),
        sender_id: "alice".into(),
        recipient_id: "bob".into(),
        body: body.into(),
        created_at: Utc::now(),
        sync: SyncMeta::default(),
    }
}

async fn repository(
    remote: MockRemote,
    online: bool,
) -> (SyncRepository<SendMessage>, Arc<dyn LocalStore>) {
    let store: Arc<dyn LocalStore> = Arc::new(memory_store().await);
    let repo = SyncRepository::new(
        Arc::clone(&store),
        Arc::new(remote),
        connectivity(online),
        &AppConfig::default(),
    );
    (repo, store)
}

#[tokio::test]
async fn online_write_is_synced_and_cached() {
    let mut remote = MockRemote::new();
    remote
        .expect_submit()
        .times(1)
        .withf(|mutation, _| mutation.body == "hi")
        .returning(|_, _| Ok(server_message("msg_1", "hi")));

    let (repo, store) = repository(remote, true).await;
    let outcome = repo.write(send("hi")).await.unwrap();

    let WriteOutcome::Synced(message) = outcome else {
        panic!("expected a synced write");
    };
    assert_eq!(message.id.as_str(), "msg_1");
    assert!(message.sync.is_synced);

    let cached = repo.cached(&message.id).await.unwrap().unwrap();
    assert!(cached.sync.is_synced);
    assert_eq!(store.outbox_counts().await.unwrap().retriable, 0);
}

#[tokio::test]
async fn offline_write_is_queued_without_calling_remote() {
    let mut remote = MockRemote::new();
    remote.expect_submit().times(0);

    let (repo, store) = repository(remote, false).await;
    let outcome = repo.write(send("later")).await.unwrap();

    let WriteOutcome::Queued {
        entity,
        action,
        reason,
    } = outcome
    else {
        panic!("expected a queued write");
    };
    assert!(entity.id.is_provisional());
    assert!(!entity.sync.is_synced);
    assert_eq!(action.entity_id, entity.id);
    assert_eq!(action.retry_count, 0);
    assert_eq!(reason, AppError::NoConnectivity);

    let listed = store.list_retriable().await.unwrap();
    assert_eq!(listed.len(), 1);
    let unsynced = repo.cached_view(&EntityQuery::unsynced()).await.unwrap();
    assert_eq!(unsynced.len(), 1);
    assert_eq!(unsynced[0].id, entity.id);
    assert_eq!(unsynced[0].body, "later");
}

#[tokio::test]
async fn failed_submit_queues_with_the_same_key() {
    let seen = Arc::new(StdMutex::new(None::<String>));
    let recorded = Arc::clone(&seen);

    let mut remote = MockRemote::new();
    remote.expect_submit().times(1).returning(move |_, key| {
        *recorded.lock().unwrap() = Some(key.as_str().to_string());
        Err(AppError::rejected(503, "unavailable"))
    });

    let (repo, _store) = repository(remote, true).await;
    let outcome = repo.write(send("retry me")).await.unwrap();

    let WriteOutcome::Queued { action, reason, .. } = outcome else {
        panic!("expected a queued write");
    };
    assert!(reason.is_transient());
    assert_eq!(
        seen.lock().unwrap().as_deref(),
        Some(action.idempotency_key.as_str())
    );
}

#[tokio::test]
async fn invalid_input_is_rejected_before_anything_is_stored() {
    let mut remote = MockRemote::new();
    remote.expect_submit().times(0);

    let (repo, store) = repository(remote, true).await;
    let err = repo.write(send("   ")).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(store.outbox_counts().await.unwrap().retriable, 0);
}

#[tokio::test]
async fn read_writes_snapshot_through_and_keeps_local_drafts() {
    let mut remote = MockRemote::new();
    remote
        .expect_fetch()
        .times(1)
        .returning(|_| Ok(vec![server_message("msg_7", "from server")]));

    let (repo, store) = repository(remote, true).await;
    let draft = Message {
        id: EntityId::provisional(),
        sync: SyncMeta::pending(),
        ..server_message("msg_0", "draft")
    };
    store.upsert(draft.to_stored().unwrap()).await.unwrap();

    let outcome = repo.read(&EntityQuery::scoped("conv_1")).await.unwrap();

    assert!(outcome.is_fresh());
    assert_eq!(outcome.items.len(), 2);
    let fetched = outcome
        .items
        .iter()
        .find(|m| m.id.as_str() == "msg_7")
        .unwrap();
    assert!(fetched.sync.is_synced);
    assert!(fetched.sync.last_synced_at.is_some());
    assert!(outcome.items.iter().any(|m| m.id == draft.id));
}

#[tokio::test]
async fn failed_fetch_serves_stale_cache() {
    let mut remote = MockRemote::new();
    remote
        .expect_fetch()
        .times(1)
        .returning(|_| Err(AppError::Timeout));

    let (repo, store) = repository(remote, true).await;
    let mut cached = server_message("msg_3", "cached");
    cached.sync = SyncMeta::synced_at(Utc::now());
    store.upsert(cached.to_stored().unwrap()).await.unwrap();

    let outcome = repo.read(&EntityQuery::all()).await.unwrap();

    assert_eq!(
        outcome.freshness,
        Freshness::Stale {
            reason: AppError::Timeout
        }
    );
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].id, cached.id);
    assert_eq!(outcome.items[0].body, "cached");
}

#[tokio::test]
async fn offline_read_skips_the_remote() {
    let mut remote = MockRemote::new();
    remote.expect_fetch().times(0);

    let (repo, _store) = repository(remote, false).await;
    let outcome = repo.read(&EntityQuery::all()).await.unwrap();

    assert_eq!(
        outcome.freshness,
        Freshness::Stale {
            reason: AppError::NoConnectivity
        }
    );
    assert!(outcome.items.is_empty());
}

#[tokio::test]
async fn snapshot_does_not_clobber_unsynced_local_edit() {
    let mut remote = MockRemote::new();
    remote
        .expect_fetch()
        .times(1)
        .returning(|_| Ok(vec![server_message("msg_5", "server copy")]));

    let (repo, store) = repository(remote, true).await;
    let mut local = server_message("msg_5", "local edit");
    local.sync = SyncMeta::pending();
    store.upsert(local.to_stored().unwrap()).await.unwrap();

    repo.read(&EntityQuery::all()).await.unwrap();

    let cached = repo
        .cached(&EntityId::parse("msg_5").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.body, "local edit");
    assert!(!cached.sync.is_synced);
}

#[tokio::test]
async fn like_on_an_unconfirmable_draft_is_rejected() {
    let mut remote = MockPostRemote::new();
    remote.expect_submit().times(0);
    let store: Arc<dyn LocalStore> = Arc::new(memory_store().await);
    let repo = SyncRepository::new(
        Arc::clone(&store),
        Arc::new(remote),
        connectivity(false),
        &AppConfig::default(),
    );

    let upload = PostMutation::Upload(UploadPost {
        author_id: "me".into(),
        caption: "draft".into(),
        media_url: None,
    });
    let WriteOutcome::Queued { entity, action, .. } = repo.write(upload).await.unwrap() else {
        panic!("expected a queued write");
    };
    let like = || {
        PostMutation::Like(LikeToggle {
            post_id: entity.id.clone(),
            liked: true,
        })
    };

    let err = repo.write(like()).await.unwrap_err();
    assert_eq!(err, AppError::MutationPending(entity.id.to_string()));

    store
        .record_failure(action.id, Utc::now(), "422 rejected", true)
        .await
        .unwrap();
    let err = repo.write(like()).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let actions = store
        .list_actions(&PendingActionFilter::default())
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
    let cached = repo.cached(&entity.id).await.unwrap().unwrap();
    assert!(!cached.liked_by_me);
}

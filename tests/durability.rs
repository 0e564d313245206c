mod common;

use std::sync::Arc;

use common::setup_with_store;
use feedsync_lib::application::ports::{DispatchTrigger, LocalStore, OutboxStore};
use feedsync_lib::application::services::WriteOutcome;
use feedsync_lib::domain::entities::{EntityQuery, SendMessage};
use feedsync_lib::infrastructure::database::{ConnectionPool, SqliteSyncStore};
use tempfile::TempDir;

async fn open_store(dir: &TempDir) -> (ConnectionPool, Arc<dyn LocalStore>) {
    let path = dir.path().join("feedsync.db");
    let url = format!("sqlite://{}", path.display());
    let pool = ConnectionPool::new(&url, 2).await.unwrap();
    pool.migrate().await.unwrap();
    let store: Arc<dyn LocalStore> = Arc::new(SqliteSyncStore::new(pool.clone()));
    (pool, store)
}

#[tokio::test]
async fn queued_write_survives_a_restart() {
    let dir = TempDir::new().unwrap();

    let (pool, store) = open_store(&dir).await;
    let ctx = setup_with_store(store, false);
    let outcome = ctx
        .engine
        .messages
        .write(SendMessage {
            conversation_id: "conv_9".into(),
            sender_id: "me".into(),
            recipient_id: "bob".into(),
            body: "see you tomorrow".into(),
        })
        .await
        .unwrap();
    let WriteOutcome::Queued { entity, action, .. } = outcome else {
        panic!("offline write must be queued");
    };
    drop(ctx);
    pool.close().await;

    let (pool, store) = open_store(&dir).await;
    let restored = store.get_action(action.id).await.unwrap().unwrap();
    assert_eq!(restored.idempotency_key, action.idempotency_key);
    assert_eq!(restored.payload, action.payload);
    assert_eq!(restored.retry_count, 0);

    let ctx = setup_with_store(store, true);
    let cached = ctx
        .engine
        .messages
        .cached_view(&EntityQuery::scoped("conv_9"))
        .await
        .unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, entity.id);

    let report = ctx
        .engine
        .dispatcher
        .run_pass(DispatchTrigger::Startup)
        .await
        .unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(ctx.remotes.messages.created().len(), 1);
    assert_eq!(ctx.store.outbox_counts().await.unwrap().retriable, 0);
    pool.close().await;
}

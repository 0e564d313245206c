#![allow(dead_code)]

pub mod fake_remote;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use feedsync_lib::application::ports::LocalStore;
use feedsync_lib::domain::entities::{
    AddComment, FollowRequest, PostMutation, SendMessage, Story, SyncMeta, UploadStory,
};
use feedsync_lib::domain::value_objects::EntityId;
use feedsync_lib::infrastructure::connectivity::SharedConnectivity;
use feedsync_lib::infrastructure::database::{ConnectionPool, SqliteSyncStore};
use feedsync_lib::{AppConfig, RemoteSet, SyncEngine};
use sqlx::sqlite::SqlitePoolOptions;

use fake_remote::{
    FakeRemote, comment_remote, follow_remote, message_remote, post_remote, story_remote,
};

pub struct FakeRemotes {
    pub messages: Arc<FakeRemote<SendMessage>>,
    pub posts: Arc<FakeRemote<PostMutation>>,
    pub stories: Arc<FakeRemote<UploadStory>>,
    pub comments: Arc<FakeRemote<AddComment>>,
    pub follows: Arc<FakeRemote<FollowRequest>>,
}

impl FakeRemotes {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(message_remote()),
            posts: Arc::new(post_remote()),
            stories: Arc::new(story_remote()),
            comments: Arc::new(comment_remote()),
            follows: Arc::new(follow_remote()),
        }
    }

    pub fn as_set(&self) -> RemoteSet {
        RemoteSet {
            messages: self.messages.clone(),
            posts: self.posts.clone(),
            stories: self.stories.clone(),
            comments: self.comments.clone(),
            follows: self.follows.clone(),
        }
    }
}

pub struct TestContext {
    pub engine: SyncEngine,
    pub remotes: FakeRemotes,
    pub connectivity: Arc<SharedConnectivity>,
    pub store: Arc<dyn LocalStore>,
}

pub async fn memory_pool() -> ConnectionPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    ConnectionPool::from_pool(pool)
}

pub async fn setup(online: bool) -> TestContext {
    let store: Arc<dyn LocalStore> = Arc::new(SqliteSyncStore::new(memory_pool().await));
    setup_with_store(store, online)
}

pub fn setup_with_store(store: Arc<dyn LocalStore>, online: bool) -> TestContext {
    let connectivity = Arc::new(SharedConnectivity::new(online));
    let remotes = FakeRemotes::new();
    let engine = SyncEngine::assemble(
        &AppConfig::default(),
        Arc::clone(&store),
        connectivity.clone(),
        remotes.as_set(),
        None,
    );
    TestContext {
        engine,
        remotes,
        connectivity,
        store,
    }
}

pub fn story(id: &str, author: &str, created_at: DateTime<Utc>, ttl: Duration) -> Story {
    Story {
        id: EntityId::parse(id).expect("story id"),
        author_id: author.to_string(),
        media_url: format!("https://cdn.example/{id}.jpg"),
        created_at,
        expires_at: created_at + ttl,
        sync: SyncMeta::default(),
    }
}

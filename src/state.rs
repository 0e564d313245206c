use crate::application::ports::{
    AccessTokenProvider, ConnectivityMonitor, DispatchEventEmitter, LocalStore, RemoteGateway,
};
use crate::application::services::{OutboxDispatcher, StoryRepository, SyncRepository};
use crate::domain::entities::{AddComment, FollowRequest, PostMutation, SendMessage, UploadStory};
use crate::infrastructure::database::{ConnectionPool, SqliteSyncStore};
use crate::infrastructure::offline::DispatchMetrics;
use crate::infrastructure::remote::HttpRemoteGateway;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;

/// Remote endpoints, one per entity family.
#[derive(Clone)]
pub struct RemoteSet {
    pub messages: Arc<dyn RemoteGateway<SendMessage>>,
    pub posts: Arc<dyn RemoteGateway<PostMutation>>,
    pub stories: Arc<dyn RemoteGateway<UploadStory>>,
    pub comments: Arc<dyn RemoteGateway<AddComment>>,
    pub follows: Arc<dyn RemoteGateway<FollowRequest>>,
}

impl RemoteSet {
    pub fn http(
        config: &AppConfig,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            messages: Arc::new(HttpRemoteGateway::<SendMessage>::new(
                &config.remote,
                Arc::clone(&tokens),
            )?),
            posts: Arc::new(HttpRemoteGateway::<PostMutation>::new(
                &config.remote,
                Arc::clone(&tokens),
            )?),
            stories: Arc::new(HttpRemoteGateway::<UploadStory>::new(
                &config.remote,
                Arc::clone(&tokens),
            )?),
            comments: Arc::new(HttpRemoteGateway::<AddComment>::new(
                &config.remote,
                Arc::clone(&tokens),
            )?),
            follows: Arc::new(HttpRemoteGateway::<FollowRequest>::new(
                &config.remote,
                tokens,
            )?),
        })
    }
}

/// Fully wired engine: one repository per family sharing a store, plus the
/// dispatcher that replays their queued writes.
pub struct SyncEngine {
    pub store: Arc<dyn LocalStore>,
    pub connectivity: Arc<dyn ConnectivityMonitor>,
    pub messages: Arc<SyncRepository<SendMessage>>,
    pub posts: Arc<SyncRepository<PostMutation>>,
    pub stories: Arc<StoryRepository>,
    pub comments: Arc<SyncRepository<AddComment>>,
    pub follows: Arc<SyncRepository<FollowRequest>>,
    pub dispatcher: Arc<OutboxDispatcher>,
    pub metrics: Arc<DispatchMetrics>,
}

impl SyncEngine {
    /// Opens the database, runs migrations and wires the HTTP gateways.
    pub async fn open(
        config: &AppConfig,
        connectivity: Arc<dyn ConnectivityMonitor>,
        tokens: Arc<dyn AccessTokenProvider>,
        emitter: Option<Arc<dyn DispatchEventEmitter>>,
    ) -> Result<Self, AppError> {
        let pool = ConnectionPool::new(&config.database.url, config.database.max_connections)
            .await?;
        pool.migrate().await?;
        let store: Arc<dyn LocalStore> = Arc::new(SqliteSyncStore::new(pool));
        let remotes = RemoteSet::http(config, tokens)?;
        Ok(Self::assemble(config, store, connectivity, remotes, emitter))
    }

    pub fn assemble(
        config: &AppConfig,
        store: Arc<dyn LocalStore>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        remotes: RemoteSet,
        emitter: Option<Arc<dyn DispatchEventEmitter>>,
    ) -> Self {
        let messages = Arc::new(SyncRepository::new(
            Arc::clone(&store),
            remotes.messages,
            Arc::clone(&connectivity),
            config,
        ));
        let posts = Arc::new(SyncRepository::new(
            Arc::clone(&store),
            remotes.posts,
            Arc::clone(&connectivity),
            config,
        ));
        let story_repository = Arc::new(SyncRepository::new(
            Arc::clone(&store),
            remotes.stories,
            Arc::clone(&connectivity),
            config,
        ));
        let comments = Arc::new(SyncRepository::new(
            Arc::clone(&store),
            remotes.comments,
            Arc::clone(&connectivity),
            config,
        ));
        let follows = Arc::new(SyncRepository::new(
            Arc::clone(&store),
            remotes.follows,
            Arc::clone(&connectivity),
            config,
        ));

        let metrics = Arc::new(DispatchMetrics::new());
        let mut dispatcher = OutboxDispatcher::new(Arc::clone(&store), Arc::clone(&connectivity))
            .with_replayer(messages.clone())
            .with_replayer(posts.clone())
            .with_replayer(story_repository.clone())
            .with_replayer(comments.clone())
            .with_replayer(follows.clone())
            .with_metrics(Arc::clone(&metrics));
        if let Some(emitter) = emitter {
            dispatcher = dispatcher.with_emitter(emitter);
        }

        Self {
            store,
            connectivity,
            messages,
            posts,
            stories: Arc::new(StoryRepository::new(story_repository)),
            comments,
            follows,
            dispatcher: Arc::new(dispatcher),
            metrics,
        }
    }
}

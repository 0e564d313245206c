use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use feedsync_lib::AppError;
use feedsync_lib::application::ports::RemoteGateway;
use feedsync_lib::domain::entities::{
    AddComment, Comment, EntityModel, EntityQuery, FollowEdge, FollowRequest, FollowStatus,
    Message, MutationModel, Post, PostMutation, SendMessage, Story, SyncMeta, UploadStory,
};
use feedsync_lib::domain::value_objects::{EntityId, IdempotencyKey};
use tokio::sync::Notify;

type Builder<M> =
    Box<dyn Fn(&M, EntityId) -> <M as MutationModel>::Entity + Send + Sync + 'static>;

struct FakeState<E> {
    submit_failures: VecDeque<AppError>,
    fetch_failures: VecDeque<AppError>,
    by_key: HashMap<String, E>,
    created: Vec<E>,
    lost_responses: u32,
    submit_calls: u32,
    fetch_calls: u32,
    next_id: u64,
    snapshot: Vec<E>,
    held_fetch: Option<Arc<Notify>>,
    held_submit: Option<Arc<Notify>>,
}

/// Scripted backend. Creates a resource per unseen idempotency key and
/// answers repeated keys with the resource created the first time.
pub struct FakeRemote<M: MutationModel> {
    prefix: &'static str,
    build: Builder<M>,
    state: Mutex<FakeState<M::Entity>>,
}

#[allow(dead_code)]
impl<M: MutationModel> FakeRemote<M> {
    pub fn new(
        prefix: &'static str,
        first_id: u64,
        build: impl Fn(&M, EntityId) -> M::Entity + Send + Sync + 'static,
    ) -> Self {
        Self {
            prefix,
            build: Box::new(build),
            state: Mutex::new(FakeState {
                submit_failures: VecDeque::new(),
                fetch_failures: VecDeque::new(),
                by_key: HashMap::new(),
                created: Vec::new(),
                lost_responses: 0,
                submit_calls: 0,
                fetch_calls: 0,
                next_id: first_id,
                snapshot: Vec::new(),
                held_fetch: None,
                held_submit: None,
            }),
        }
    }

    pub fn fail_next_submit(&self, err: AppError) {
        self.state.lock().unwrap().submit_failures.push_back(err);
    }

    pub fn fail_submits(&self, err: AppError, times: usize) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..times {
            state.submit_failures.push_back(err.clone());
        }
    }

    /// The next submit creates the resource but the caller sees a timeout,
    /// as if the response was lost on the way back.
    pub fn lose_next_response(&self) {
        self.state.lock().unwrap().lost_responses += 1;
    }

    pub fn fail_next_fetch(&self, err: AppError) {
        self.state.lock().unwrap().fetch_failures.push_back(err);
    }

    pub fn set_snapshot(&self, items: Vec<M::Entity>) {
        self.state.lock().unwrap().snapshot = items;
    }

    /// The next fetch captures the current snapshot and then waits for the
    /// returned handle to be notified.
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state.lock().unwrap().held_fetch = Some(Arc::clone(&notify));
        notify
    }

    /// The next submit is counted and then waits for the returned handle.
    pub fn hold_next_submit(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state.lock().unwrap().held_submit = Some(Arc::clone(&notify));
        notify
    }

    pub fn fetch_calls(&self) -> u32 {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn created(&self) -> Vec<M::Entity> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn submit_calls(&self) -> u32 {
        self.state.lock().unwrap().submit_calls
    }
}

#[async_trait]
impl<M: MutationModel> RemoteGateway<M> for FakeRemote<M> {
    async fn submit(&self, mutation: &M, key: &IdempotencyKey) -> Result<M::Entity, AppError> {
        let held = {
            let mut state = self.state.lock().unwrap();
            state.submit_calls += 1;
            state.held_submit.take()
        };
        if let Some(notify) = held {
            notify.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.submit_failures.pop_front() {
            return Err(err);
        }
        if let Some(existing) = state.by_key.get(key.as_str()) {
            return Ok(existing.clone());
        }

        let id = match mutation.target_id() {
            Some(target) => target.clone(),
            None => {
                let id = EntityId::new(format!("{}_{}", self.prefix, state.next_id)).unwrap();
                state.next_id += 1;
                id
            }
        };
        let entity = (self.build)(mutation, id);
        state.by_key.insert(key.as_str().to_string(), entity.clone());
        state.created.push(entity.clone());
        if state.lost_responses > 0 {
            state.lost_responses -= 1;
            return Err(AppError::Timeout);
        }
        Ok(entity)
    }

    async fn fetch(&self, query: &EntityQuery) -> Result<Vec<M::Entity>, AppError> {
        let (items, held) = {
            let mut state = self.state.lock().unwrap();
            state.fetch_calls += 1;
            if let Some(err) = state.fetch_failures.pop_front() {
                return Err(err);
            }
            let items: Vec<M::Entity> = state
                .snapshot
                .iter()
                .filter(|item| {
                    query
                        .scope_id
                        .as_deref()
                        .map_or(true, |scope| item.scope_id() == scope)
                })
                .cloned()
                .collect();
            (items, state.held_fetch.take())
        };
        if let Some(notify) = held {
            notify.notified().await;
        }
        Ok(items)
    }
}

pub fn message_remote() -> FakeRemote<SendMessage> {
    FakeRemote::new("msg", 1, |m: &SendMessage, id| Message {
        id,
        conversation_id: m.conversation_id.clone(),
        sender_id: m.sender_id.clone(),
        recipient_id: m.recipient_id.clone(),
        body: m.body.clone(),
        created_at: Utc::now(),
        sync: SyncMeta::default(),
    })
}

pub fn post_remote() -> FakeRemote<PostMutation> {
    FakeRemote::new("post", 123, |m: &PostMutation, id| match m {
        PostMutation::Upload(upload) => Post {
            id,
            author_id: upload.author_id.clone(),
            caption: upload.caption.clone(),
            media_url: upload.media_url.clone(),
            like_count: 0,
            liked_by_me: false,
            created_at: Utc::now(),
            sync: SyncMeta::default(),
        },
        PostMutation::Like(like) => Post {
            id,
            author_id: "someone".into(),
            caption: String::new(),
            media_url: None,
            like_count: u32::from(like.liked),
            liked_by_me: like.liked,
            created_at: Utc::now(),
            sync: SyncMeta::default(),
        },
    })
}

pub fn story_remote() -> FakeRemote<UploadStory> {
    FakeRemote::new("story", 1, |m: &UploadStory, id| {
        let now = Utc::now();
        Story {
            id,
            author_id: m.author_id.clone(),
            media_url: m.media_url.clone(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(24),
            sync: SyncMeta::default(),
        }
    })
}

pub fn comment_remote() -> FakeRemote<AddComment> {
    FakeRemote::new("comment", 1, |m: &AddComment, id| Comment {
        id,
        post_id: m.post_id.clone(),
        author_id: m.author_id.clone(),
        body: m.body.clone(),
        created_at: Utc::now(),
        sync: SyncMeta::default(),
    })
}

pub fn follow_remote() -> FakeRemote<FollowRequest> {
    FakeRemote::new("follow", 1, |m: &FollowRequest, id| FollowEdge {
        id,
        follower_id: m.follower_id.clone(),
        followee_id: m.followee_id.clone(),
        status: FollowStatus::Requested,
        created_at: Utc::now(),
        sync: SyncMeta::default(),
    })
}

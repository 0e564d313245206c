//! REST adapter for the remote gateway port.
//!
//! Every response is wrapped in `{ success, message, data }`. Timestamps in
//! `data` are epoch milliseconds, matching the entity serde layout.

use crate::application::ports::{AccessTokenProvider, RemoteGateway};
use crate::domain::entities::{
    AddComment, EntityQuery, FollowRequest, MutationModel, PostMutation, SendMessage, UploadStory,
};
use crate::domain::value_objects::IdempotencyKey;
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
const MAX_LOG_BODY_CHARS: usize = 512;

/// Where a mutation is sent and where its family is listed.
pub trait HttpRoute: MutationModel {
    const COLLECTION_PATH: &'static str;

    fn submit_method(&self) -> Method {
        Method::POST
    }

    fn submit_path(&self) -> String {
        Self::COLLECTION_PATH.to_string()
    }
}

impl HttpRoute for SendMessage {
    const COLLECTION_PATH: &'static str = "/messages";
}

impl HttpRoute for PostMutation {
    const COLLECTION_PATH: &'static str = "/posts";

    fn submit_method(&self) -> Method {
        match self {
            PostMutation::Upload(_) => Method::POST,
            PostMutation::Like(_) => Method::PUT,
        }
    }

    fn submit_path(&self) -> String {
        match self {
            PostMutation::Upload(_) => Self::COLLECTION_PATH.to_string(),
            PostMutation::Like(like) => format!("/posts/{}/like", like.post_id),
        }
    }
}

impl HttpRoute for UploadStory {
    const COLLECTION_PATH: &'static str = "/stories";
}

impl HttpRoute for AddComment {
    const COLLECTION_PATH: &'static str = "/comments";

    fn submit_path(&self) -> String {
        format!("/posts/{}/comments", self.post_id)
    }
}

impl HttpRoute for FollowRequest {
    const COLLECTION_PATH: &'static str = "/follows";
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    message: Option<String>,
    data: Option<T>,
}

pub struct HttpRemoteGateway<M> {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
    _mutation: PhantomData<fn() -> M>,
}

impl<M: HttpRoute> HttpRemoteGateway<M> {
    pub fn new(
        config: &RemoteConfig,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| AppError::InvalidInput(format!("HTTP client setup failed: {err}")))?;

        Ok(Self::with_client(client, &config.base_url, tokens))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            _mutation: PhantomData,
        }
    }

    async fn headers(&self, key: Option<&IdempotencyKey>) -> Result<HeaderMap, AppError> {
        let token = self.tokens.access_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| AppError::Unauthenticated("Invalid access token format".to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);

        if let Some(key) = key {
            let key_value = HeaderValue::from_str(key.as_str())
                .map_err(|_| AppError::InvalidInput("Invalid idempotency key".to_string()))?;
            headers.insert(IDEMPOTENCY_KEY_HEADER, key_value);
        }
        Ok(headers)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        let body = response.text().await?;
        log_response(status, &body);
        decode_envelope(status, &body)
    }
}

#[async_trait]
impl<M: HttpRoute> RemoteGateway<M> for HttpRemoteGateway<M> {
    async fn submit(&self, mutation: &M, key: &IdempotencyKey) -> Result<M::Entity, AppError> {
        let url = format!("{}{}", self.base_url, mutation.submit_path());
        let response = self
            .client
            .request(mutation.submit_method(), &url)
            .headers(self.headers(Some(key)).await?)
            .json(mutation)
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    async fn fetch(&self, query: &EntityQuery) -> Result<Vec<M::Entity>, AppError> {
        let url = format!("{}{}", self.base_url, M::COLLECTION_PATH);
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(scope_id) = &query.scope_id {
            params.push(("scopeId", scope_id.clone()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .headers(self.headers(None).await?)
            .query(&params)
            .send()
            .await?;
        Self::read_envelope(response).await
    }
}

fn log_response(status: StatusCode, body: &str) {
    if status.is_success() {
        tracing::debug!(target: "feedsync::remote", status = %status, "API response");
        return;
    }

    let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        preview.push_str("...");
    }
    tracing::debug!(
        target: "feedsync::remote",
        status = %status,
        body = %preview,
        "API error response"
    );
}

fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, AppError> {
    let code = status.as_u16();
    let envelope = serde_json::from_str::<ApiEnvelope<T>>(body);

    if code == 401 || code == 403 {
        let message = envelope
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or_else(|| status.to_string());
        return Err(AppError::Unauthenticated(message));
    }

    if !status.is_success() {
        let message = match envelope {
            Ok(ApiEnvelope {
                message: Some(message),
                ..
            }) => message,
            _ => format!("Request failed: {body}"),
        };
        return Err(AppError::rejected(code, message));
    }

    let envelope = envelope
        .map_err(|err| AppError::rejected(code, format!("Failed to parse response: {err}")))?;
    if !envelope.success {
        return Err(AppError::rejected(
            code,
            envelope
                .message
                .unwrap_or_else(|| "Request reported failure".to_string()),
        ));
    }
    envelope
        .data
        .ok_or_else(|| AppError::rejected(code, "Response carried no data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LikeToggle, Post, UploadPost};
    use crate::domain::value_objects::EntityId;

    #[test]
    fn decodes_success_envelope_with_millis() {
        let body = r#"{
            "success": true,
            "message": null,
            "data": {
                "id": "post_123",
                "authorId": "me",
                "caption": "hi",
                "mediaUrl": null,
                "likeCount": 0,
                "likedByMe": false,
                "createdAt": 1700000000000
            }
        }"#;
        let post: Post = decode_envelope(StatusCode::CREATED, body).unwrap();
        assert_eq!(post.id.as_str(), "post_123");
        assert_eq!(post.created_at.timestamp_millis(), 1_700_000_000_000);
        assert!(!post.sync.is_synced);
    }

    #[test]
    fn maps_status_codes_to_taxonomy() {
        let auth = decode_envelope::<Post>(
            StatusCode::UNAUTHORIZED,
            r#"{"success":false,"message":"token expired"}"#,
        )
        .unwrap_err();
        assert_eq!(auth, AppError::Unauthenticated("token expired".into()));

        let unavailable =
            decode_envelope::<Post>(StatusCode::SERVICE_UNAVAILABLE, "upstream down").unwrap_err();
        assert!(unavailable.is_transient());

        let bad = decode_envelope::<Post>(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"message":"caption too long"}"#,
        )
        .unwrap_err();
        assert_eq!(bad, AppError::rejected(400, "caption too long"));
        assert!(!bad.is_transient());
    }

    #[test]
    fn unsuccessful_envelope_is_rejected() {
        let err = decode_envelope::<Post>(
            StatusCode::OK,
            r#"{"success":false,"message":"duplicate"}"#,
        )
        .unwrap_err();
        assert_eq!(err, AppError::rejected(200, "duplicate"));
    }

    #[test]
    fn post_routes_follow_mutation_kind() {
        let upload = PostMutation::Upload(UploadPost {
            author_id: "me".into(),
            caption: "hi".into(),
            media_url: None,
        });
        assert_eq!(upload.submit_method(), Method::POST);
        assert_eq!(upload.submit_path(), "/posts");

        let like = PostMutation::Like(LikeToggle {
            post_id: EntityId::parse("post_7").unwrap(),
            liked: true,
        });
        assert_eq!(like.submit_method(), Method::PUT);
        assert_eq!(like.submit_path(), "/posts/post_7/like");
    }
}

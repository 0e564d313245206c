use crate::domain::entities::{EntityQuery, MutationModel};
use crate::domain::value_objects::IdempotencyKey;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Request/response contract with the backend for one mutation type.
///
/// `submit` must be safe to repeat with the same key: the server answers a
/// repeated key with the resource it created the first time.
#[async_trait]
pub trait RemoteGateway<M: MutationModel>: Send + Sync {
    async fn submit(&self, mutation: &M, key: &IdempotencyKey) -> Result<M::Entity, AppError>;

    async fn fetch(&self, query: &EntityQuery) -> Result<Vec<M::Entity>, AppError>;
}

/// Source of the bearer token attached to remote calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AppError>;
}

/// Token fixed at construction time, typically read from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AppError> {
        self.token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AppError::Unauthenticated("No access token configured".to_string()))
    }
}

use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::db::StateStore;
use crate::error::AppError;
use crate::error::AppResult;
use crate::models::{PersistedUserState, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    UserState(UserId),
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::UserState(user_id) => write!(f, "user_state:{}", user_id),
        }
    }
}

/// Creates a Redis client for the state store
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Stores each user's document as one JSON string
///
/// A single SET replaces the whole document, so a write is never partially applied.
#[derive(Clone)]
pub struct RedisStateStore {
    redis_client: Client,
}

impl RedisStateStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }
}

#[async_trait::async_trait]
impl StateStore for RedisStateStore {
    async fn load(&self, user_id: &UserId) -> AppResult<Option<PersistedUserState>> {
        let key = StoreKey::UserState(user_id.clone());
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(key.to_string()).await?;

        match stored {
            Some(json) => {
                let state = serde_json::from_str(&json).map_err(|e| {
                    tracing::error!(error = %e, key = %key, "Corrupt user state document");
                    AppError::Persistence(format!("State deserialization error: {}", e))
                })?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, user_id: &UserId, state: &PersistedUserState) -> AppResult<()> {
        let key = StoreKey::UserState(user_id.clone());
        let json = serde_json::to_string(state)
            .map_err(|e| AppError::Persistence(format!("State serialization error: {}", e)))?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(key.to_string(), json).await?;

        tracing::debug!(key = %key, playlists = state.playlists.len(), "User state saved");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

// Tests below the key tests need a Redis server at REDIS_URL (default localhost:6379)

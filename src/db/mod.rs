pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::MemoryStateStore;
pub use postgres::{create_pool, PostgresStateStore};
pub use redis::{create_redis_client, RedisStateStore};

use crate::{
    error::AppResult,
    models::{PersistedUserState, UserId},
};

/// Durable home of each user's state document
///
/// Writes replace the whole document. There is no concurrency token: the last write observed by
/// the backend wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    /// Loads a user's document, `None` if the user has never saved anything
    async fn load(&self, user_id: &UserId) -> AppResult<Option<PersistedUserState>>;

    /// Replaces a user's document. Either all of it is written or none of it.
    async fn save(&self, user_id: &UserId, state: &PersistedUserState) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

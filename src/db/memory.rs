use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::StateStore;
use crate::{
    error::{AppError, AppResult},
    models::{PersistedUserState, UserId},
};

/// Process-local store for tests and single-process local runs
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    documents: Arc<RwLock<HashMap<UserId, String>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, user_id: &UserId) -> AppResult<Option<PersistedUserState>> {
        let documents = self.documents.read().await;
        match documents.get(user_id) {
            Some(json) => Ok(Some(serde_json::from_str(json).map_err(|e| {
                AppError::Persistence(format!("corrupt document: {}", e))
            })?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user_id: &UserId, state: &PersistedUserState) -> AppResult<()> {
        // Stored serialized so loads never alias the caller's value
        let json = serde_json::to_string(state).map_err(|e| {
            AppError::Persistence(format!("serialization error: {}", e))
        })?;
        self.documents.write().await.insert(user_id.clone(), json);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

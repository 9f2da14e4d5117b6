use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    db::StateStore,
    error::AppResult,
    models::{SessionContext, UserId, UserState},
    services::{PendingRecommendations, PlaylistSource, RecommendationEngine},
};

type SessionMap = HashMap<UserId, Arc<Mutex<UserState>>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub playlist_source: Arc<dyn PlaylistSource>,
    pub recommender: Arc<dyn RecommendationEngine>,
    pub pending_recommendations: PendingRecommendations,
    sessions: Arc<RwLock<SessionMap>>,
}

impl AppState {
    /// Creates application state with no sessions loaded yet
    pub fn new(
        store: Arc<dyn StateStore>,
        playlist_source: Arc<dyn PlaylistSource>,
        recommender: Arc<dyn RecommendationEngine>,
    ) -> Self {
        Self {
            store,
            playlist_source,
            recommender,
            pending_recommendations: PendingRecommendations::new(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Locks the caller's session and brings it up to date with the store.
    ///
    /// The guard serializes this user's requests within the process. The document is re-read on
    /// every call so writes from other instances are picked up, except while the session holds a
    /// change whose save failed.
    pub async fn session(&self, ctx: &SessionContext) -> AppResult<OwnedMutexGuard<UserState>> {
        let mut state = self.entry(&ctx.user_id).await.lock_owned().await;

        if !state.unsaved {
            let loaded = self.store.load(&ctx.user_id).await.map_err(|e| {
                tracing::error!(user_id = %ctx.user_id, error = %e, "Failed to load user state");
                e
            })?;
            *state = loaded.map(UserState::from).unwrap_or_default();
        } else {
            tracing::debug!(user_id = %ctx.user_id, "Keeping unsaved session state");
        }

        Ok(state)
    }

    async fn entry(&self, user_id: &UserId) -> Arc<Mutex<UserState>> {
        if let Some(state) = self.sessions.read().await.get(user_id) {
            return Arc::clone(state);
        }

        let mut sessions = self.sessions.write().await;
        evict_idle(&mut sessions);
        Arc::clone(sessions.entry(user_id.clone()).or_insert_with(|| {
            tracing::debug!(user_id = %user_id, "User session started");
            Arc::new(Mutex::new(UserState::default()))
        }))
    }
}

/// Drops sessions nobody is using and that have nothing left to save.
///
/// A session is in use while a request holds a clone of its handle; handles are only cloned under
/// the map lock, so the count cannot grow during the sweep.
fn evict_idle(sessions: &mut SessionMap) {
    sessions.retain(|_, state| {
        Arc::strong_count(state) > 1 || state.try_lock().map_or(true, |s| s.unsaved)
    });
}

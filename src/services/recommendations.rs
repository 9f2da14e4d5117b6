use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::{
    error::{AppError, AppResult},
    models::{Playlist, RecommendedVideo, UserId, VideoId, VideoSummary},
    services::providers::RecommendationEngine,
};

/// Splits a playlist into watched and unwatched summaries, in catalog order
pub fn partition(
    playlist: &Playlist,
    watched: Option<&HashSet<VideoId>>,
) -> (Vec<VideoSummary>, Vec<VideoSummary>) {
    playlist
        .videos
        .iter()
        .map(|v| v.summary())
        .partition(|s| watched.is_some_and(|w| w.contains(&s.id)))
}

/// Suggests the next video to watch in a playlist.
///
/// Needs at least one watched and one unwatched video. The engine's answer is only trusted when
/// the ID it returns is one of the unwatched videos; anything else degrades to
/// `AppError::RecommendationUnavailable`.
pub async fn recommend_next(
    engine: &dyn RecommendationEngine,
    playlist: &Playlist,
    watched: Option<&HashSet<VideoId>>,
) -> AppResult<RecommendedVideo> {
    let (watched, unwatched) = partition(playlist, watched);

    if watched.is_empty() {
        return Err(AppError::InvalidInput(
            "Not enough data: watch at least one video to get a recommendation".to_string(),
        ));
    }
    if unwatched.is_empty() {
        return Err(AppError::InvalidInput(
            "Playlist complete: every video has been watched".to_string(),
        ));
    }

    let recommendation = engine.recommend(&watched, &unwatched).await.map_err(|e| {
        tracing::warn!(
            playlist_id = %playlist.id,
            provider = engine.name(),
            error = %e,
            "Recommendation engine failed"
        );
        match e {
            AppError::RecommendationUnavailable(_) => e,
            other => AppError::RecommendationUnavailable(other.to_string()),
        }
    })?;

    if !unwatched
        .iter()
        .any(|s| s.id == recommendation.recommended_id)
    {
        tracing::warn!(
            playlist_id = %playlist.id,
            recommended_id = %recommendation.recommended_id,
            provider = engine.name(),
            "Engine recommended a video outside the unwatched set"
        );
        return Err(AppError::RecommendationUnavailable(format!(
            "engine returned '{}', which is not an unwatched video of this playlist",
            recommendation.recommended_id
        )));
    }

    if recommendation.reasoning.trim().is_empty() {
        return Err(AppError::RecommendationUnavailable(
            "engine returned empty reasoning".to_string(),
        ));
    }

    let video = playlist
        .video(&recommendation.recommended_id)
        .cloned()
        .ok_or_else(|| {
            AppError::Internal(format!(
                "validated video '{}' missing from catalog",
                recommendation.recommended_id
            ))
        })?;

    Ok(RecommendedVideo {
        video,
        reasoning: recommendation.reasoning,
    })
}

/// Users with a recommendation request outstanding
///
/// A user may have at most one request in flight; a second one is refused instead of racing the
/// first.
#[derive(Clone, Default)]
pub struct PendingRecommendations {
    users: Arc<Mutex<HashSet<UserId>>>,
}

/// Marks a user's request as outstanding until dropped
pub struct PendingGuard {
    users: Arc<Mutex<HashSet<UserId>>>,
    user_id: UserId,
}

impl PendingRecommendations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, user_id: &UserId) -> AppResult<PendingGuard> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| AppError::Internal("pending recommendations lock poisoned".to_string()))?;

        if !users.insert(user_id.clone()) {
            return Err(AppError::RecommendationInProgress);
        }

        Ok(PendingGuard {
            users: Arc::clone(&self.users),
            user_id: user_id.clone(),
        })
    }

    #[cfg(test)]
    fn is_pending(&self, user_id: &UserId) -> bool {
        self.users
            .lock()
            .map(|users| users.contains(user_id))
            .unwrap_or(false)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Ok(mut users) = self.users.lock() {
            users.remove(&self.user_id);
        }
    }
}

use serde::Serialize;

use crate::{
    db::StateStore,
    error::{AppError, AppResult},
    models::{PlaylistId, Progress, SessionContext, UserState, VideoId},
    services::progress,
};

/// Outcome of a successful toggle
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToggleResult {
    pub watched: bool,
    pub progress: Progress,
}

/// Flips a video's watched flag and persists the user's state.
///
/// Unknown playlists and videos are rejected before anything changes. When the save fails the
/// toggle stays applied in memory and `AppError::Persistence` is returned: the in-memory value is
/// the last known good state.
pub async fn toggle_watched(
    store: &dyn StateStore,
    ctx: &SessionContext,
    state: &mut UserState,
    playlist_id: &PlaylistId,
    video_id: &VideoId,
) -> AppResult<ToggleResult> {
    let playlist = state
        .playlist(playlist_id)
        .ok_or_else(|| AppError::NotFound(format!("Playlist '{}'", playlist_id)))?;
    if !playlist.contains(video_id) {
        return Err(AppError::NotFound(format!(
            "Video '{}' in playlist '{}'",
            video_id, playlist_id
        )));
    }

    let watched = state.watch_state.toggle(playlist_id, video_id);

    if let Err(e) = store.save(&ctx.user_id, &state.to_persisted()).await {
        state.unsaved = true;
        tracing::warn!(
            user_id = %ctx.user_id,
            playlist_id = %playlist_id,
            video_id = %video_id,
            watched = watched,
            error = %e,
            "Toggle applied in memory but not persisted"
        );
        return Err(e);
    }
    state.unsaved = false;

    let progress = state
        .playlist(playlist_id)
        .map(|p| progress::playlist_progress(state, p))
        .unwrap_or_default();

    tracing::debug!(
        user_id = %ctx.user_id,
        playlist_id = %playlist_id,
        video_id = %video_id,
        watched = watched,
        completed = progress.completed,
        "Watch state toggled"
    );

    Ok(ToggleResult { watched, progress })
}

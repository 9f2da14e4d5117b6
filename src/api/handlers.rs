use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Playlist, PlaylistId, Progress, RecommendedVideo, SessionContext, VideoId},
    services::{
        catalog,
        progress::{self, Dashboard},
        recommendations,
        watch_state::{self, ToggleResult},
    },
};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct ImportPlaylistRequest {
    /// Playlist ID or a playlist URL
    pub source: String,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Playlists, watched IDs and progress for the caller
pub async fn get_dashboard(
    State(state): State<AppState>,
    ctx: SessionContext,
) -> AppResult<Json<Dashboard>> {
    let user_state = state.session(&ctx).await?;
    Ok(Json(progress::dashboard(&user_state)))
}

/// Import a playlist from the catalog source
pub async fn import_playlist(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ctx: SessionContext,
    Json(request): Json<ImportPlaylistRequest>,
) -> AppResult<(StatusCode, Json<Playlist>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %ctx.user_id,
        source = %request.source,
        "Processing playlist import"
    );

    let mut user_state = state.session(&ctx).await?;

    let playlist = catalog::import_playlist(
        state.store.as_ref(),
        state.playlist_source.as_ref(),
        &ctx,
        &mut user_state,
        &request.source,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(playlist)))
}

/// Remove a playlist and its watch history
pub async fn delete_playlist(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(playlist_id): Path<String>,
) -> AppResult<StatusCode> {
    let mut user_state = state.session(&ctx).await?;

    catalog::remove_playlist(
        state.store.as_ref(),
        &ctx,
        &mut user_state,
        &PlaylistId(playlist_id),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Progress of a single playlist
pub async fn get_playlist_progress(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(playlist_id): Path<String>,
) -> AppResult<Json<Progress>> {
    let user_state = state.session(&ctx).await?;

    let playlist = user_state
        .playlist(&PlaylistId(playlist_id.clone()))
        .ok_or_else(|| AppError::NotFound(format!("Playlist '{}'", playlist_id)))?;

    Ok(Json(progress::playlist_progress(&user_state, playlist)))
}

/// Flip a video between watched and unwatched
pub async fn toggle_watched(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> AppResult<Json<ToggleResult>> {
    let mut user_state = state.session(&ctx).await?;

    let result = watch_state::toggle_watched(
        state.store.as_ref(),
        &ctx,
        &mut user_state,
        &PlaylistId(playlist_id),
        &VideoId(video_id),
    )
    .await?;

    Ok(Json(result))
}

/// Ask the recommendation engine for the next video in a playlist
pub async fn recommend_next(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ctx: SessionContext,
    Path(playlist_id): Path<String>,
) -> AppResult<Json<RecommendedVideo>> {
    let _pending = state.pending_recommendations.begin(&ctx.user_id)?;

    // Snapshot so the session lock is not held while the engine runs
    let (playlist, watched) = {
        let user_state = state.session(&ctx).await?;
        let playlist_id = PlaylistId(playlist_id);
        let playlist = user_state
            .playlist(&playlist_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Playlist '{}'", playlist_id)))?;
        let watched = user_state.watch_state.watched_in(&playlist_id).cloned();
        (playlist, watched)
    };

    tracing::info!(
        request_id = %request_id,
        user_id = %ctx.user_id,
        playlist_id = %playlist.id,
        "Processing recommendation request"
    );

    let recommendation =
        recommendations::recommend_next(state.recommender.as_ref(), &playlist, watched.as_ref())
            .await?;

    tracing::info!(
        request_id = %request_id,
        recommended_id = %recommendation.video.id,
        "Recommendation completed"
    );

    Ok(Json(recommendation))
}

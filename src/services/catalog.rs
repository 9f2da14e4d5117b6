use reqwest::Url;

use crate::{
    db::StateStore,
    error::{AppError, AppResult},
    models::{Playlist, PlaylistId, SessionContext, UserState},
    services::providers::PlaylistSource,
};

/// Extracts a playlist ID from either a bare ID or a URL with a `list=` parameter
pub fn parse_playlist_source(input: &str) -> AppResult<PlaylistId> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::Import(
            "Invalid source identifier: input is empty".to_string(),
        ));
    }

    let candidate = if input.contains("://") {
        let url = Url::parse(input)
            .map_err(|e| AppError::Import(format!("Invalid playlist URL: {}", e)))?;
        url.query_pairs()
            .find(|(key, _)| key == "list")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| {
                AppError::Import("Invalid playlist URL: missing 'list' parameter".to_string())
            })?
    } else {
        input.to_string()
    };

    let valid = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !valid {
        return Err(AppError::Import(format!(
            "Invalid source identifier: '{}'",
            candidate
        )));
    }

    Ok(PlaylistId(candidate))
}

/// Imports a playlist into the user's catalog and persists the result.
///
/// Duplicates are rejected before any remote call. If the save fails the new playlist is taken
/// back out of memory, so the import either fully applies or fully fails.
pub async fn import_playlist(
    store: &dyn StateStore,
    source: &dyn PlaylistSource,
    ctx: &SessionContext,
    state: &mut UserState,
    raw_source: &str,
) -> AppResult<Playlist> {
    let playlist_id = parse_playlist_source(raw_source)?;

    if state.has_playlist(&playlist_id) {
        return Err(AppError::AlreadyExists(format!(
            "Playlist '{}' has already been imported",
            playlist_id
        )));
    }

    let playlist = source.fetch_playlist(&playlist_id).await?;

    state.playlists.push(playlist.clone());

    if let Err(e) = store.save(&ctx.user_id, &state.to_persisted()).await {
        state.playlists.pop();
        tracing::error!(
            user_id = %ctx.user_id,
            playlist_id = %playlist_id,
            error = %e,
            "Failed to persist imported playlist, import rolled back"
        );
        return Err(e);
    }
    state.unsaved = false;

    tracing::info!(
        user_id = %ctx.user_id,
        playlist_id = %playlist_id,
        videos = playlist.videos.len(),
        provider = source.name(),
        "Playlist imported"
    );

    Ok(playlist)
}

/// Removes a playlist and its watched set, restoring both if the save fails
pub async fn remove_playlist(
    store: &dyn StateStore,
    ctx: &SessionContext,
    state: &mut UserState,
    playlist_id: &PlaylistId,
) -> AppResult<()> {
    let index = state
        .playlists
        .iter()
        .position(|p| &p.id == playlist_id)
        .ok_or_else(|| AppError::NotFound(format!("Playlist '{}'", playlist_id)))?;

    let removed = state.playlists.remove(index);
    let removed_watched = state.watch_state.remove_playlist(playlist_id);

    if let Err(e) = store.save(&ctx.user_id, &state.to_persisted()).await {
        state.playlists.insert(index, removed);
        if let Some(watched) = removed_watched {
            state.watch_state.restore_playlist(playlist_id.clone(), watched);
        }
        tracing::error!(
            user_id = %ctx.user_id,
            playlist_id = %playlist_id,
            error = %e,
            "Failed to persist playlist removal, removal rolled back"
        );
        return Err(e);
    }
    state.unsaved = false;

    tracing::info!(user_id = %ctx.user_id, playlist_id = %playlist_id, "Playlist removed");
    Ok(())
}

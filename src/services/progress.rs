use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Playlist, Progress, UserState, VideoId};

/// Progress of one playlist given its watched set.
///
/// Watched IDs that are not in the catalog are ignored.
pub fn aggregate(playlist: &Playlist, watched: Option<&HashSet<VideoId>>) -> Progress {
    let completed = match watched {
        Some(watched) => playlist
            .videos
            .iter()
            .filter(|v| watched.contains(&v.id))
            .count(),
        None => 0,
    };
    Progress::new(completed, playlist.videos.len())
}

/// Progress of one of the user's playlists
pub fn playlist_progress(state: &UserState, playlist: &Playlist) -> Progress {
    aggregate(playlist, state.watch_state.watched_in(&playlist.id))
}

/// Sum over all of the user's playlists, percentage taken from the sums
pub fn aggregate_overall(state: &UserState) -> Progress {
    state
        .playlists
        .iter()
        .map(|playlist| playlist_progress(state, playlist))
        .sum()
}

/// One playlist as shown on the dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistOverview {
    #[serde(flatten)]
    pub playlist: Playlist,
    /// Watched IDs present in the catalog, in catalog order
    pub watched_video_ids: Vec<VideoId>,
    pub progress: Progress,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub playlists: Vec<PlaylistOverview>,
    pub overall: Progress,
}

/// Everything the dashboard shows for one user
pub fn dashboard(state: &UserState) -> Dashboard {
    let playlists = state
        .playlists
        .iter()
        .map(|playlist| PlaylistOverview {
            watched_video_ids: watched_in_catalog(state, playlist),
            progress: playlist_progress(state, playlist),
            playlist: playlist.clone(),
        })
        .collect();

    Dashboard {
        playlists,
        overall: aggregate_overall(state),
    }
}

fn watched_in_catalog(state: &UserState, playlist: &Playlist) -> Vec<VideoId> {
    playlist
        .videos
        .iter()
        .filter(|v| state.watch_state.is_watched(&playlist.id, &v.id))
        .map(|v| v.id.clone())
        .collect()
}

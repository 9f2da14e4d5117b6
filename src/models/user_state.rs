use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use super::{Playlist, PlaylistId, VideoId, WatchState};

/// Identifier of a user account, as issued by the authentication provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Explicit identity of the caller, passed to every catalog and watch-state operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: UserId,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id.into()),
        }
    }
}

/// Per-user document as written to the store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedUserState {
    #[serde(default)]
    pub playlists: Vec<Playlist>,
    #[serde(default)]
    pub watched_video_ids: BTreeMap<PlaylistId, Vec<VideoId>>,
}

/// In-memory state of one user session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    pub playlists: Vec<Playlist>,
    pub watch_state: WatchState,
    /// Set while the last save failed; the in-memory value then takes precedence over the store
    pub unsaved: bool,
}

impl UserState {
    pub fn playlist(&self, playlist_id: &PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|p| &p.id == playlist_id)
    }

    pub fn has_playlist(&self, playlist_id: &PlaylistId) -> bool {
        self.playlist(playlist_id).is_some()
    }

    pub fn to_persisted(&self) -> PersistedUserState {
        PersistedUserState {
            playlists: self.playlists.clone(),
            watched_video_ids: self.watch_state.to_lists(),
        }
    }
}

impl From<PersistedUserState> for UserState {
    fn from(doc: PersistedUserState) -> Self {
        Self {
            playlists: doc.playlists,
            watch_state: WatchState::from_lists(doc.watched_video_ids),
            unsaved: false,
        }
    }
}

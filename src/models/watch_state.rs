use std::collections::{BTreeMap, HashMap, HashSet};

use super::{PlaylistId, VideoId};

/// Per-playlist sets of watched video IDs for one user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchState {
    watched: HashMap<PlaylistId, HashSet<VideoId>>,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the watched flag for a video and returns whether it is now watched.
    ///
    /// A playlist with no prior entry starts from an empty set.
    pub fn toggle(&mut self, playlist_id: &PlaylistId, video_id: &VideoId) -> bool {
        let set = self.watched.entry(playlist_id.clone()).or_default();
        if set.remove(video_id) {
            false
        } else {
            set.insert(video_id.clone());
            true
        }
    }

    pub fn is_watched(&self, playlist_id: &PlaylistId, video_id: &VideoId) -> bool {
        self.watched
            .get(playlist_id)
            .is_some_and(|set| set.contains(video_id))
    }

    /// Watched set for a playlist, if any toggle ever touched it
    pub fn watched_in(&self, playlist_id: &PlaylistId) -> Option<&HashSet<VideoId>> {
        self.watched.get(playlist_id)
    }

    pub fn remove_playlist(&mut self, playlist_id: &PlaylistId) -> Option<HashSet<VideoId>> {
        self.watched.remove(playlist_id)
    }

    pub fn restore_playlist(&mut self, playlist_id: PlaylistId, watched: HashSet<VideoId>) {
        self.watched.insert(playlist_id, watched);
    }

    /// Persisted form: sorted lists instead of sets
    pub fn to_lists(&self) -> BTreeMap<PlaylistId, Vec<VideoId>> {
        self.watched
            .iter()
            .map(|(playlist_id, set)| {
                let mut ids: Vec<VideoId> = set.iter().cloned().collect();
                ids.sort();
                (playlist_id.clone(), ids)
            })
            .collect()
    }

    pub fn from_lists(lists: BTreeMap<PlaylistId, Vec<VideoId>>) -> Self {
        Self {
            watched: lists
                .into_iter()
                .map(|(playlist_id, ids)| (playlist_id, ids.into_iter().collect()))
                .collect(),
        }
    }
}

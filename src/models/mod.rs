use serde::Deserialize;

mod playlist;
mod progress;
mod recommendation;
mod user_state;
mod watch_state;

pub use playlist::{Playlist, PlaylistId, Video, VideoId, VideoSummary, UNKNOWN_DURATION};
pub use progress::Progress;
pub use recommendation::{Recommendation, RecommendedVideo};
pub use user_state::{PersistedUserState, SessionContext, UserId, UserState};
pub use watch_state::WatchState;

// ============================================================================
// YouTube Data API Types
// ============================================================================

/// Titles YouTube substitutes for entries the viewer cannot access
const UNAVAILABLE_TITLES: [&str; 2] = ["Private video", "Deleted video"];

/// Response from GET /playlists
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubePlaylistListResponse {
    #[serde(default)]
    pub items: Vec<YouTubePlaylistResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubePlaylistResource {
    pub snippet: YouTubePlaylistSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubePlaylistSnippet {
    pub title: String,
}

/// One page from GET /playlistItems
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubePlaylistItemsPage {
    #[serde(default)]
    pub items: Vec<YouTubePlaylistItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubePlaylistItem {
    pub snippet: YouTubeItemSnippet,
    pub content_details: YouTubeContentDetails,
}

impl YouTubePlaylistItem {
    /// Private, deleted and id-less entries never reach the catalog
    pub fn is_available(&self) -> bool {
        !self.content_details.video_id.is_empty()
            && !UNAVAILABLE_TITLES.contains(&self.snippet.title.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeItemSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Option<YouTubeThumbnails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeContentDetails {
    #[serde(default)]
    pub video_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTubeThumbnails {
    pub maxres: Option<YouTubeThumbnail>,
    pub standard: Option<YouTubeThumbnail>,
    pub high: Option<YouTubeThumbnail>,
    pub medium: Option<YouTubeThumbnail>,
    pub default: Option<YouTubeThumbnail>,
}

impl YouTubeThumbnails {
    /// Highest resolution variant present, largest first
    pub fn best_url(&self) -> Option<&str> {
        [
            &self.maxres,
            &self.standard,
            &self.high,
            &self.medium,
            &self.default,
        ]
        .into_iter()
        .flatten()
        .map(|t| t.url.as_str())
        .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeThumbnail {
    pub url: String,
}

/// Error envelope returned with non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeErrorResponse {
    pub error: YouTubeErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeErrorBody {
    #[serde(default)]
    pub message: String,
}

/// YouTube Data API v3 playlist source
///
/// API Flow:
/// 1. Title: /playlists?part=snippet&id={id} → playlist name (missing for private/deleted lists)
/// 2. Items: /playlistItems?part=snippet,contentDetails → pages of 50, followed via nextPageToken
use crate::{
    error::{AppError, AppResult},
    models::{
        Playlist, PlaylistId, Video, VideoId, YouTubeErrorResponse, YouTubePlaylistItem,
        YouTubePlaylistItemsPage, YouTubePlaylistListResponse, UNKNOWN_DURATION,
    },
    services::providers::PlaylistSource,
};
use chrono::Utc;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::collections::HashSet;

const PAGE_SIZE: &str = "50";
/// YouTube caps playlists at 5000 items, i.e. 100 pages
const MAX_PAGES: usize = 200;

#[derive(Clone)]
pub struct YouTubePlaylistSource {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl YouTubePlaylistSource {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// GETs an API resource and decodes it, turning every failure into an import error
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}/{}", self.api_url, resource);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Import(format!("YouTube API unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Import(format!("Failed to read YouTube response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<YouTubeErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AppError::Import(format!(
                "YouTube API error ({}) on {}: {}",
                status, resource, message
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                resource = resource,
                "Failed to deserialize YouTube response"
            );
            AppError::Import(format!("Failed to parse YouTube response: {}", e))
        })
    }

    async fn fetch_title(&self, playlist_id: &PlaylistId) -> AppResult<String> {
        let response: YouTubePlaylistListResponse = self
            .get_json("playlists", &[("part", "snippet"), ("id", playlist_id.as_str())])
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet.title)
            .ok_or_else(|| {
                AppError::Import(
                    "Could not retrieve playlist title. The playlist might be private or deleted."
                        .to_string(),
                )
            })
    }

    async fn fetch_items(&self, playlist_id: &PlaylistId) -> AppResult<Vec<YouTubePlaylistItem>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0;

        loop {
            let mut query = vec![
                ("part", "snippet,contentDetails"),
                ("playlistId", playlist_id.as_str()),
                ("maxResults", PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: YouTubePlaylistItemsPage = self.get_json("playlistItems", &query).await?;
            pages += 1;
            items.extend(page.items);

            let token = match page.next_page_token {
                Some(token) if !token.is_empty() => token,
                _ => break,
            };
            if !seen_tokens.insert(token.clone()) {
                return Err(AppError::Import(format!(
                    "YouTube returned page token '{}' twice for playlist '{}'",
                    token, playlist_id
                )));
            }
            if pages >= MAX_PAGES {
                return Err(AppError::Import(format!(
                    "Playlist '{}' exceeds {} pages",
                    playlist_id, MAX_PAGES
                )));
            }
            page_token = Some(token);
        }

        tracing::debug!(
            playlist_id = %playlist_id,
            pages = pages,
            items = items.len(),
            "Fetched playlist items"
        );

        Ok(items)
    }
}

/// Builds catalog videos from raw items, dropping unavailable ones.
///
/// The position suffix counts kept items across all pages, so IDs stay unique even when the
/// same source video appears twice.
fn to_videos(playlist_id: &PlaylistId, items: Vec<YouTubePlaylistItem>) -> Vec<Video> {
    items
        .into_iter()
        .filter(YouTubePlaylistItem::is_available)
        .enumerate()
        .map(|(position, item)| {
            let thumbnail_url = item
                .snippet
                .thumbnails
                .as_ref()
                .and_then(|t| t.best_url())
                .unwrap_or_default()
                .to_string();
            let source_id = item.content_details.video_id;

            Video {
                id: VideoId(format!("{}-{}-{}", playlist_id, source_id, position)),
                video_id: source_id,
                title: item.snippet.title,
                description: item.snippet.description,
                thumbnail_url,
                duration: UNKNOWN_DURATION.to_string(),
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl PlaylistSource for YouTubePlaylistSource {
    async fn fetch_playlist(&self, playlist_id: &PlaylistId) -> AppResult<Playlist> {
        let name = self.fetch_title(playlist_id).await?;
        let items = self.fetch_items(playlist_id).await?;
        let raw_count = items.len();
        let videos = to_videos(playlist_id, items);

        if videos.is_empty() {
            return Err(AppError::Import(format!(
                "Playlist '{}' has no available videos",
                name
            )));
        }

        tracing::info!(
            playlist_id = %playlist_id,
            videos = videos.len(),
            dropped = raw_count - videos.len(),
            provider = self.name(),
            "Playlist fetched"
        );

        Ok(Playlist {
            id: playlist_id.clone(),
            name,
            videos,
            imported_at: Some(Utc::now()),
        })
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}

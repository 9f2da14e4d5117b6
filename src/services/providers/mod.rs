/// External provider abstractions
///
/// The catalog source and the recommendation engine are both remote collaborators. Each sits
/// behind a trait so the HTTP layer and tests can swap implementations freely.
use crate::{
    error::AppResult,
    models::{Playlist, PlaylistId, Recommendation, VideoSummary},
};

pub mod gemini;
pub mod youtube;

pub use gemini::GeminiRecommendationEngine;
pub use youtube::YouTubePlaylistSource;

/// Source of playlist catalogs
#[async_trait::async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Fetches a complete playlist.
    ///
    /// Returned videos have unique IDs, follow the source's pagination order, and exclude
    /// private, deleted or otherwise unavailable entries. Every failure is `AppError::Import`.
    async fn fetch_playlist(&self, playlist_id: &PlaylistId) -> AppResult<Playlist>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Generative recommendation boundary
///
/// One call per request and no retries. Implementations do not check that the returned ID is
/// among `unwatched`; that is the caller's job, see `services::recommendations`.
#[async_trait::async_trait]
pub trait RecommendationEngine: Send + Sync {
    async fn recommend(
        &self,
        watched: &[VideoSummary],
        unwatched: &[VideoSummary],
    ) -> AppResult<Recommendation>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

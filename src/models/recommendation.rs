use serde::{Deserialize, Serialize};

use super::{Video, VideoId};

/// Result of one recommendation engine call. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub recommended_id: VideoId,
    pub reasoning: String,
}

/// A validated recommendation resolved to its catalog entry
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendedVideo {
    pub video: Video,
    pub reasoning: String,
}

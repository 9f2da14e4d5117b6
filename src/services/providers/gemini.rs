/// Gemini-backed recommendation engine
///
/// Sends the watch history as a structured prompt to `generateContent` and asks for JSON output
/// matching a response schema. The reply is decoded and checked for empty fields; membership of
/// the returned ID is checked by the caller.
use crate::{
    error::{AppError, AppResult},
    models::{Recommendation, VideoId, VideoSummary},
    services::providers::RecommendationEngine,
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Write;

const SYSTEM_INSTRUCTION: &str = "You are an intelligent video recommendation engine for a \
platform called TrackTube. Your task is to recommend the single most relevant unwatched video \
from a given playlist, based on the user's previously watched videos.";

#[derive(Clone)]
pub struct GeminiRecommendationEngine {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiRecommendationEngine {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        )
    }
}

/// Renders the watched and unwatched lists into the user prompt
fn build_prompt(watched: &[VideoSummary], unwatched: &[VideoSummary]) -> String {
    let mut prompt = String::from("Here are the videos the user has already watched:\n");
    write_videos(&mut prompt, watched);
    prompt.push_str("\nHere are the unwatched videos available in the playlist:\n");
    write_videos(&mut prompt, unwatched);
    prompt.push_str(
        "\nAnalyze the watched videos to understand the user's preferences and then select ONE \
unwatched video that you believe is the best fit for them to watch next.\n\
Provide the Video ID of the recommended video as recommendedVideoId and a concise reasoning \
for your choice.\n",
    );
    prompt
}

fn write_videos(prompt: &mut String, videos: &[VideoSummary]) {
    for video in videos {
        let _ = write!(
            prompt,
            "Video ID: {}\nTitle: {}\nDescription: {}\n---\n",
            video.id, video.title, video.description
        );
    }
}

/// JSON schema the model output must follow
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "recommendedVideoId": {
                "type": "STRING",
                "description": "The Video ID of the recommended unwatched video."
            },
            "reasoning": {
                "type": "STRING",
                "description": "A brief explanation of why this video was recommended based on the user's watched history."
            }
        },
        "required": ["recommendedVideoId", "reasoning"]
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Structured output produced by the model
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationOutput {
    recommended_video_id: String,
    reasoning: String,
}

fn unavailable(message: impl Into<String>) -> AppError {
    AppError::RecommendationUnavailable(message.into())
}

/// Extracts and validates the structured recommendation from a raw response body
fn parse_response(body: &str) -> AppResult<Recommendation> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| unavailable(format!("malformed Gemini response: {}", e)))?;

    let text = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or_else(|| unavailable("Gemini returned no candidates"))?;

    let output: RecommendationOutput = serde_json::from_str(text.trim())
        .map_err(|e| unavailable(format!("model output failed schema validation: {}", e)))?;

    let recommended_id = output.recommended_video_id.trim();
    let reasoning = output.reasoning.trim();

    if recommended_id.is_empty() {
        return Err(unavailable("model returned an empty video ID"));
    }
    if reasoning.is_empty() {
        return Err(unavailable("model returned empty reasoning"));
    }

    Ok(Recommendation {
        recommended_id: VideoId(recommended_id.to_string()),
        reasoning: reasoning.to_string(),
    })
}

#[async_trait::async_trait]
impl RecommendationEngine for GeminiRecommendationEngine {
    async fn recommend(
        &self,
        watched: &[VideoSummary],
        unwatched: &[VideoSummary],
    ) -> AppResult<Recommendation> {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: build_prompt(watched, unwatched),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| unavailable(format!("Gemini API unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read Gemini response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!(status = %status, body = %body, "Gemini API returned an error");
            return Err(unavailable(format!("Gemini API returned status {}", status)));
        }

        let recommendation = parse_response(&body)?;

        tracing::info!(
            watched = watched.len(),
            unwatched = unwatched.len(),
            recommended_id = %recommendation.recommended_id,
            model = %self.model,
            provider = self.name(),
            "Recommendation generated"
        );

        Ok(recommendation)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

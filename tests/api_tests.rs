use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};
use tokio::sync::Notify;

use tracktube_api::{
    api::{create_router, AppState},
    db::{MemoryStateStore, StateStore},
    error::{AppError, AppResult},
    models::{Playlist, PlaylistId, Recommendation, UserId, Video, VideoId, VideoSummary},
    services::{PlaylistSource, RecommendationEngine},
};

const PLAYLIST: &str = "PLrust";

/// Serves canned playlists keyed by ID
struct FakeSource {
    playlists: HashMap<String, Playlist>,
}

#[async_trait::async_trait]
impl PlaylistSource for FakeSource {
    async fn fetch_playlist(&self, playlist_id: &PlaylistId) -> AppResult<Playlist> {
        self.playlists
            .get(playlist_id.as_str())
            .cloned()
            .ok_or_else(|| AppError::Import(format!("Playlist '{}' not found", playlist_id)))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

enum Answer {
    FirstUnwatched,
    Fixed(&'static str),
}

struct FakeEngine {
    answer: Answer,
}

#[async_trait::async_trait]
impl RecommendationEngine for FakeEngine {
    async fn recommend(
        &self,
        _watched: &[VideoSummary],
        unwatched: &[VideoSummary],
    ) -> AppResult<Recommendation> {
        let recommended_id = match self.answer {
            Answer::FirstUnwatched => unwatched[0].id.clone(),
            Answer::Fixed(id) => VideoId::from(id),
        };
        Ok(Recommendation {
            recommended_id,
            reasoning: "Builds directly on the last video you watched.".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Blocks inside the engine until released, signalling once it has been entered
struct GatedEngine {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait::async_trait]
impl RecommendationEngine for GatedEngine {
    async fn recommend(
        &self,
        _watched: &[VideoSummary],
        unwatched: &[VideoSummary],
    ) -> AppResult<Recommendation> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Recommendation {
            recommended_id: unwatched[0].id.clone(),
            reasoning: "Next in the series.".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

fn video(playlist_id: &str, source_id: &str, position: usize) -> Video {
    Video {
        id: VideoId(format!("{}-{}-{}", playlist_id, source_id, position)),
        video_id: source_id.to_string(),
        title: format!("Video {}", source_id),
        description: format!("About {}", source_id),
        thumbnail_url: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", source_id),
        duration: "0:00".to_string(),
    }
}

fn playlist(id: &str, name: &str, source_ids: &[&str]) -> Playlist {
    Playlist {
        id: PlaylistId::from(id),
        name: name.to_string(),
        videos: source_ids
            .iter()
            .enumerate()
            .map(|(i, s)| video(id, s, i))
            .collect(),
        imported_at: None,
    }
}

fn create_test_server(answer: Answer) -> TestServer {
    create_server_with(
        Arc::new(MemoryStateStore::new()),
        Arc::new(FakeEngine { answer }),
    )
}

fn create_server_with(
    store: Arc<dyn StateStore>,
    engine: Arc<dyn RecommendationEngine>,
) -> TestServer {
    let source = FakeSource {
        playlists: HashMap::from([
            (
                PLAYLIST.to_string(),
                playlist(PLAYLIST, "Learning Rust", &["A", "B", "C"]),
            ),
            (
                "PLsql".to_string(),
                playlist("PLsql", "SQL Basics", &["D", "E", "F", "G", "H", "I", "J"]),
            ),
        ]),
    };

    let state = AppState::new(store, Arc::new(source), engine);
    TestServer::new(create_router(state)).unwrap()
}

fn as_user(request: TestRequest, user: &'static str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_static(user),
    )
}

fn video_path(playlist_id: &str, source_id: &str, position: usize) -> String {
    format!(
        "/api/v1/playlists/{}/videos/{}-{}-{}/toggle",
        playlist_id, playlist_id, source_id, position
    )
}

async fn import(server: &TestServer, user: &'static str, source: &str) {
    as_user(server.post("/api/v1/playlists"), user)
        .json(&json!({ "source": source }))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(Answer::FirstUnwatched);
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = create_test_server(Answer::FirstUnwatched);
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_missing_user_is_unauthorized() {
    let server = create_test_server(Answer::FirstUnwatched);
    let response = server.get("/api/v1/dashboard").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn test_empty_dashboard() {
    let server = create_test_server(Answer::FirstUnwatched);
    let response = as_user(server.get("/api/v1/dashboard"), "alice").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["playlists"], json!([]));
    assert_eq!(body["overall"]["percentage"], 0);
}

#[tokio::test]
async fn test_import_playlist_from_url() {
    let server = create_test_server(Answer::FirstUnwatched);

    let response = as_user(server.post("/api/v1/playlists"), "alice")
        .json(&json!({ "source": "https://www.youtube.com/playlist?list=PLrust" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["id"], PLAYLIST);
    assert_eq!(created["name"], "Learning Rust");
    assert_eq!(created["videos"].as_array().unwrap().len(), 3);
    assert_eq!(created["videos"][0]["id"], "PLrust-A-0");
    assert_eq!(created["videos"][0]["videoId"], "A");
}

#[tokio::test]
async fn test_duplicate_import_conflicts() {
    let server = create_test_server(Answer::FirstUnwatched);
    import(&server, "alice", PLAYLIST).await;

    let response = as_user(server.post("/api/v1/playlists"), "alice")
        .json(&json!({ "source": PLAYLIST }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let dashboard: Value = as_user(server.get("/api/v1/dashboard"), "alice").await.json();
    assert_eq!(dashboard["playlists"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_playlist_import_fails() {
    let server = create_test_server(Answer::FirstUnwatched);

    let response = as_user(server.post("/api/v1/playlists"), "alice")
        .json(&json!({ "source": "PLmissing" }))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["kind"], "import_failure");
}

#[tokio::test]
async fn test_invalid_source_rejected() {
    let server = create_test_server(Answer::FirstUnwatched);

    let response = as_user(server.post("/api/v1/playlists"), "alice")
        .json(&json!({ "source": "https://www.youtube.com/watch?v=abc" }))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_toggle_updates_progress() {
    let server = create_test_server(Answer::FirstUnwatched);
    import(&server, "alice", PLAYLIST).await;

    let response = as_user(server.post(&video_path(PLAYLIST, "A", 0)), "alice").await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "watched": true,
        "progress": { "completed": 1, "total": 3, "remaining": 2, "percentage": 33 }
    }));

    let on: Value = as_user(server.post(&video_path(PLAYLIST, "B", 1)), "alice")
        .await
        .json();
    assert_eq!(on["watched"], true);
    assert_eq!(on["progress"]["percentage"], 67);

    let off: Value = as_user(server.post(&video_path(PLAYLIST, "B", 1)), "alice")
        .await
        .json();
    assert_eq!(off["watched"], false);
    assert_eq!(off["progress"]["percentage"], 33);

    let progress: Value = as_user(
        server.get(&format!("/api/v1/playlists/{}/progress", PLAYLIST)),
        "alice",
    )
    .await
    .json();
    assert_eq!(progress["completed"], 1);
    assert_eq!(progress["total"], 3);
}

#[tokio::test]
async fn test_toggle_unknown_video_not_found() {
    let server = create_test_server(Answer::FirstUnwatched);
    import(&server, "alice", PLAYLIST).await;

    let response = as_user(server.post(&video_path(PLAYLIST, "Z", 9)), "alice").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = as_user(server.post(&video_path("PLother", "A", 0)), "alice").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_overall_progress() {
    let server = create_test_server(Answer::FirstUnwatched);
    import(&server, "alice", PLAYLIST).await;
    import(&server, "alice", "PLsql").await;

    as_user(server.post(&video_path(PLAYLIST, "A", 0)), "alice")
        .await
        .assert_status_ok();

    let dashboard: Value = as_user(server.get("/api/v1/dashboard"), "alice").await.json();
    assert_eq!(
        dashboard["overall"],
        json!({ "completed": 1, "total": 10, "remaining": 9, "percentage": 10 })
    );
    assert_eq!(
        dashboard["playlists"][0]["watchedVideoIds"],
        json!(["PLrust-A-0"])
    );
    assert_eq!(dashboard["playlists"][1]["progress"]["completed"], 0);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let server = create_test_server(Answer::FirstUnwatched);
    import(&server, "alice", PLAYLIST).await;

    let dashboard: Value = as_user(server.get("/api/v1/dashboard"), "bob").await.json();
    assert_eq!(dashboard["playlists"], json!([]));

    // Bob can import the same playlist without a conflict
    import(&server, "bob", PLAYLIST).await;
}

#[tokio::test]
async fn test_recommendation_is_an_unwatched_video() {
    let server = create_test_server(Answer::FirstUnwatched);
    import(&server, "alice", PLAYLIST).await;
    as_user(server.post(&video_path(PLAYLIST, "A", 0)), "alice")
        .await
        .assert_status_ok();

    let response = as_user(
        server.post(&format!("/api/v1/playlists/{}/recommendation", PLAYLIST)),
        "alice",
    )
    .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["video"]["id"], "PLrust-B-1");
    assert!(!body["reasoning"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_hallucinated_recommendation_unavailable() {
    let server = create_test_server(Answer::Fixed("PLrust-A-0"));
    import(&server, "alice", PLAYLIST).await;
    as_user(server.post(&video_path(PLAYLIST, "A", 0)), "alice")
        .await
        .assert_status_ok();

    let response = as_user(
        server.post(&format!("/api/v1/playlists/{}/recommendation", PLAYLIST)),
        "alice",
    )
    .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["kind"], "recommendation_unavailable");
}

#[tokio::test]
async fn test_recommendation_needs_watch_history() {
    let server = create_test_server(Answer::FirstUnwatched);
    import(&server, "alice", PLAYLIST).await;

    let path = format!("/api/v1/playlists/{}/recommendation", PLAYLIST);
    let response = as_user(server.post(&path), "alice").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    for (source, position) in [("A", 0), ("B", 1), ("C", 2)] {
        as_user(server.post(&video_path(PLAYLIST, source, position)), "alice")
            .await
            .assert_status_ok();
    }

    // Every video watched
    let response = as_user(server.post(&path), "alice").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_remove_playlist() {
    let server = create_test_server(Answer::FirstUnwatched);
    import(&server, "alice", PLAYLIST).await;
    as_user(server.post(&video_path(PLAYLIST, "A", 0)), "alice")
        .await
        .assert_status_ok();

    let path = format!("/api/v1/playlists/{}", PLAYLIST);
    as_user(server.delete(&path), "alice")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let dashboard: Value = as_user(server.get("/api/v1/dashboard"), "alice").await.json();
    assert_eq!(dashboard["playlists"], json!([]));
    assert_eq!(dashboard["overall"]["total"], 0);

    as_user(server.delete(&path), "alice")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Re-importing starts with no watch history
    import(&server, "alice", PLAYLIST).await;
    let progress: Value = as_user(server.get(&format!("{}/progress", path)), "alice")
        .await
        .json();
    assert_eq!(progress["completed"], 0);
}

#[tokio::test]
async fn test_instances_sharing_a_store_keep_each_others_edits() {
    let store = Arc::new(MemoryStateStore::new());
    let first = create_server_with(
        store.clone(),
        Arc::new(FakeEngine {
            answer: Answer::FirstUnwatched,
        }),
    );
    let second = create_server_with(
        store.clone(),
        Arc::new(FakeEngine {
            answer: Answer::FirstUnwatched,
        }),
    );

    // Second instance has the user loaded before the first one writes
    as_user(second.get("/api/v1/dashboard"), "alice")
        .await
        .assert_status_ok();

    import(&first, "alice", PLAYLIST).await;
    import(&second, "alice", "PLsql").await;
    as_user(first.post(&video_path(PLAYLIST, "A", 0)), "alice")
        .await
        .assert_status_ok();

    let persisted = store
        .load(&UserId("alice".to_string()))
        .await
        .unwrap()
        .unwrap();
    let ids: Vec<&str> = persisted.playlists.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![PLAYLIST, "PLsql"]);
    assert_eq!(
        persisted.watched_video_ids[&PlaylistId::from(PLAYLIST)],
        vec![VideoId::from("PLrust-A-0")]
    );

    let dashboard: Value = as_user(second.get("/api/v1/dashboard"), "alice").await.json();
    assert_eq!(dashboard["overall"]["completed"], 1);
    assert_eq!(dashboard["overall"]["total"], 10);
}

#[tokio::test]
async fn test_concurrent_recommendation_rejected() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let server = create_server_with(
        Arc::new(MemoryStateStore::new()),
        Arc::new(GatedEngine {
            entered: entered.clone(),
            release: release.clone(),
        }),
    );
    import(&server, "alice", PLAYLIST).await;
    as_user(server.post(&video_path(PLAYLIST, "A", 0)), "alice")
        .await
        .assert_status_ok();

    let path = format!("/api/v1/playlists/{}/recommendation", PLAYLIST);

    let first = async { as_user(server.post(&path), "alice").await };
    let second = async {
        entered.notified().await;
        let rejected = as_user(server.post(&path), "alice").await;
        // Another user is not blocked by alice's request
        let other = as_user(server.post(&path), "bob").await;
        release.notify_one();
        (rejected, other)
    };

    let (first, (rejected, other)) = tokio::join!(first, second);

    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["video"]["id"], "PLrust-B-1");

    rejected.assert_status(StatusCode::CONFLICT);
    let body: Value = rejected.json();
    assert_eq!(body["kind"], "recommendation_in_progress");

    // Bob has no such playlist, so he gets past the in-flight check to a 404
    other.assert_status(StatusCode::NOT_FOUND);

    // The marker is released once the first request finishes
    release.notify_one();
    as_user(server.post(&path), "alice")
        .await
        .assert_status_ok();
}

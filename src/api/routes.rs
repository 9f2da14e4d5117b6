use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        // Catalog
        .route("/playlists", post(handlers::import_playlist))
        .route("/playlists/:playlist_id", delete(handlers::delete_playlist))
        // Watch state
        .route(
            "/playlists/:playlist_id/progress",
            get(handlers::get_playlist_progress),
        )
        .route(
            "/playlists/:playlist_id/videos/:video_id/toggle",
            post(handlers::toggle_watched),
        )
        // Recommendations
        .route(
            "/playlists/:playlist_id/recommendation",
            post(handlers::recommend_next),
        )
}

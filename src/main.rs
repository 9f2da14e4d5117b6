use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracktube_api::{
    api::{create_router, AppState},
    config::{Config, StorageBackend},
    db::{
        create_pool, create_redis_client, MemoryStateStore, PostgresStateStore, RedisStateStore,
        StateStore,
    },
    services::providers::{GeminiRecommendationEngine, YouTubePlaylistSource},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracktube_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = create_store(&config).await?;
    tracing::info!(backend = store.name(), "State store ready");

    let playlist_source = Arc::new(YouTubePlaylistSource::new(
        config.youtube_api_key.clone(),
        config.youtube_api_url.clone(),
    ));
    let recommender = Arc::new(GeminiRecommendationEngine::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
        config.gemini_model.clone(),
    ));

    let state = AppState::new(store, playlist_source, recommender);
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn create_store(config: &Config) -> anyhow::Result<Arc<dyn StateStore>> {
    let store: Arc<dyn StateStore> = match config.storage_backend {
        StorageBackend::Redis => {
            let client = create_redis_client(&config.redis_url)?;
            Arc::new(RedisStateStore::new(client))
        }
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database_url).await?;
            Arc::new(PostgresStateStore::new(pool).await?)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory state store; data is lost on restart");
            Arc::new(MemoryStateStore::new())
        }
    };
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

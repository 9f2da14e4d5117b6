use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::collections::{BTreeMap, HashMap};

use super::StateStore;
use crate::{
    error::AppResult,
    models::{PersistedUserState, Playlist, PlaylistId, UserId, Video, VideoId},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Normalized store: playlists, videos and watched IDs as rows keyed by (user, playlist)
///
/// A save rewrites all of the user's rows inside one transaction.
#[derive(Clone)]
pub struct PostgresStateStore {
    pool: PgPool,
}

impl PostgresStateStore {
    /// Wraps a pool and applies pending migrations
    pub async fn new(pool: PgPool) -> AppResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl StateStore for PostgresStateStore {
    async fn load(&self, user_id: &UserId) -> AppResult<Option<PersistedUserState>> {
        let playlist_rows = sqlx::query(
            r#"
            SELECT id, name, imported_at
            FROM playlists
            WHERE user_id = $1
            ORDER BY position
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let video_rows = sqlx::query(
            r#"
            SELECT playlist_id, id, source_video_id, title, description, thumbnail_url, duration
            FROM videos
            WHERE user_id = $1
            ORDER BY playlist_id, position
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let watched_rows = sqlx::query(
            r#"
            SELECT playlist_id, video_id
            FROM watched_videos
            WHERE user_id = $1
            ORDER BY playlist_id, video_id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        if playlist_rows.is_empty() && watched_rows.is_empty() {
            return Ok(None);
        }

        let mut videos: HashMap<String, Vec<Video>> = HashMap::new();
        for row in video_rows {
            let playlist_id: String = row.try_get("playlist_id")?;
            videos.entry(playlist_id).or_default().push(Video {
                id: VideoId(row.try_get("id")?),
                video_id: row.try_get("source_video_id")?,
                title: row.try_get("title")?,
                description: row.try_get("description")?,
                thumbnail_url: row.try_get("thumbnail_url")?,
                duration: row.try_get("duration")?,
            });
        }

        let mut playlists = Vec::with_capacity(playlist_rows.len());
        for row in playlist_rows {
            let id: String = row.try_get("id")?;
            let imported_at: Option<DateTime<Utc>> = row.try_get("imported_at")?;
            playlists.push(Playlist {
                videos: videos.remove(&id).unwrap_or_default(),
                id: PlaylistId(id),
                name: row.try_get("name")?,
                imported_at,
            });
        }

        let mut watched_video_ids: BTreeMap<PlaylistId, Vec<VideoId>> = BTreeMap::new();
        for row in watched_rows {
            let playlist_id: String = row.try_get("playlist_id")?;
            watched_video_ids
                .entry(PlaylistId(playlist_id))
                .or_default()
                .push(VideoId(row.try_get("video_id")?));
        }

        Ok(Some(PersistedUserState {
            playlists,
            watched_video_ids,
        }))
    }

    async fn save(&self, user_id: &UserId, state: &PersistedUserState) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Videos go with their playlists via ON DELETE CASCADE
        sqlx::query("DELETE FROM watched_videos WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM playlists WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;

        for (position, playlist) in state.playlists.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO playlists (user_id, id, name, position, imported_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(user_id.as_str())
            .bind(playlist.id.as_str())
            .bind(&playlist.name)
            .bind(position as i32)
            .bind(playlist.imported_at)
            .execute(&mut *tx)
            .await?;

            for (video_position, video) in playlist.videos.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO videos (user_id, playlist_id, id, position, source_video_id,
                                        title, description, thumbnail_url, duration)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(user_id.as_str())
                .bind(playlist.id.as_str())
                .bind(video.id.as_str())
                .bind(video_position as i32)
                .bind(&video.video_id)
                .bind(&video.title)
                .bind(&video.description)
                .bind(&video.thumbnail_url)
                .bind(&video.duration)
                .execute(&mut *tx)
                .await?;
            }
        }

        for (playlist_id, video_ids) in &state.watched_video_ids {
            for video_id in video_ids {
                sqlx::query(
                    r#"
                    INSERT INTO watched_videos (user_id, playlist_id, video_id)
                    VALUES ($1, $2, $3)
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(user_id.as_str())
                .bind(playlist_id.as_str())
                .bind(video_id.as_str())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            playlists = state.playlists.len(),
            "User state saved"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

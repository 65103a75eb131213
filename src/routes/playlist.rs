use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::db::{repository, Db};
use crate::error::ApiError;
use crate::metrics::PLAYLIST_IMPORTS;
use crate::middleware::AuthUser;
use crate::models::{ImportRequest, ImportResponse, MessageResponse, PlaylistDetail, PlaylistMeta};
use crate::services::m3u_parser;
use crate::AppState;

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Playlist owned by `user`, 404 when unknown and 403 when owned by someone else
pub(crate) async fn owned_playlist(db: &Db, id: &str, user: &AuthUser) -> Result<PlaylistMeta, ApiError> {
    let playlist = repository::playlists::find_by_id(db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Playlist not found".to_string()))?;

    if playlist.owner_id != user.id {
        return Err(ApiError::Forbidden("You do not have access to this playlist".to_string()));
    }

    Ok(playlist)
}

/// POST /api/playlist/import - Download (or accept inline) M3U text, parse and store it
pub async fn import_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<ImportRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let source_url = non_empty(payload.url);

    let content = match payload.content.filter(|c| !c.trim().is_empty()) {
        Some(content) => content,
        None => {
            let url = source_url
                .as_deref()
                .ok_or_else(|| ApiError::BadRequest("Playlist URL is required".to_string()))?;

            tracing::info!("Fetching playlist for user {}: {}", user.id, url);
            state.fetcher.fetch_text(url).await.map_err(|e| {
                tracing::warn!("Playlist download failed: {}", e);
                PLAYLIST_IMPORTS.with_label_values(&["fetch_failed"]).inc();
                ApiError::from(e)
            })?
        }
    };

    let channels = m3u_parser::parse(&content);
    if channels.is_empty() {
        PLAYLIST_IMPORTS.with_label_values(&["empty"]).inc();
        return Err(ApiError::BadRequest("No channels found in playlist".to_string()));
    }

    let imported_at = Utc::now();
    let meta = PlaylistMeta {
        id: uuid::Uuid::new_v4().to_string(),
        name: non_empty(payload.name)
            .unwrap_or_else(|| format!("Playlist {}", imported_at.timestamp_millis())),
        source_url: source_url.unwrap_or_default(),
        channel_count: channels.len(),
        imported_at,
        owner_id: user.id.clone(),
    };

    let playlist = repository::playlists::save_new(&state.db, meta, &channels)
        .await
        .map_err(|e| {
            PLAYLIST_IMPORTS.with_label_values(&["store_failed"]).inc();
            ApiError::from(e)
        })?;

    PLAYLIST_IMPORTS.with_label_values(&["ok"]).inc();
    tracing::info!("Imported playlist {} with {} channels", playlist.id, playlist.channel_count);

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            message: "Playlist imported successfully".to_string(),
            playlist,
        }),
    ))
}

/// GET /api/playlist/list - Caller's playlists (metadata only)
pub async fn list_playlists(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<PlaylistMeta>>, ApiError> {
    let playlists = repository::playlists::list_for_owner(&state.db, &user.id).await?;
    Ok(Json(playlists))
}

/// GET /api/playlist/:id - Playlist metadata with its channels
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PlaylistDetail>, ApiError> {
    let meta = owned_playlist(&state.db, &id, &user).await?;

    let channels = repository::playlists::get_channels(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Playlist content not found".to_string()))?;

    Ok(Json(PlaylistDetail { meta, channels }))
}

/// DELETE /api/playlist/:id
pub async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    owned_playlist(&state.db, &id, &user).await?;

    if !repository::playlists::delete(&state.db, &id).await? {
        return Err(ApiError::NotFound("Playlist not found".to_string()));
    }

    tracing::info!("Deleted playlist {}", id);
    Ok(Json(MessageResponse::new("Playlist deleted successfully")))
}

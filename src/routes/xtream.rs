use axum::{
    extract::{Path, State},
    http::{header::HOST, HeaderMap, StatusCode, Uri},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::db::{repository, Db};
use crate::error::ApiError;
use crate::metrics::XTREAM_REQUESTS;
use crate::middleware::{AuthUser, XtreamUser};
use crate::models::{
    GenerateConnectionRequest, GenerateConnectionResponse, MessageResponse, XStreamConnection,
};
use crate::routes::playlist::owned_playlist;
use crate::services::auth::{connection_username, generate_password, CONNECTION_PASSWORD_LEN};
use crate::services::server_address;
use crate::services::xtream::{self, PlayerApiQuery, RequestContext, XtreamRequest, XtreamResponse};
use crate::AppState;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

fn header_str<'a>(headers: &'a HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn is_forwarded_https(headers: &HeaderMap) -> bool {
    header_str(headers, FORWARDED_PROTO)
        .and_then(|v| v.split(',').next())
        .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

/// Connection owned by `user`, 404 when unknown and 403 when owned by someone else
async fn owned_connection(db: &Db, id: &str, user: &AuthUser) -> Result<XStreamConnection, ApiError> {
    let connection = repository::connections::find_by_id(db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Connection not found".to_string()))?;

    if connection.owner_id != user.id {
        return Err(ApiError::Forbidden("You do not have access to this connection".to_string()));
    }

    Ok(connection)
}

/// POST /api/xstream/generate - Create player credentials for one playlist
pub async fn generate_connection(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    headers: HeaderMap,
    Json(payload): Json<GenerateConnectionRequest>,
) -> Result<(StatusCode, Json<GenerateConnectionResponse>), ApiError> {
    let playlist_id = payload
        .playlist_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Playlist ID is required".to_string()))?;

    let playlist = owned_playlist(&state.db, &playlist_id, &user).await?;

    let server_address = server_address::resolve(
        &state.config,
        header_str(&headers, HOST),
        header_str(&headers, FORWARDED_PROTO),
    );

    let connection = repository::connections::create(
        &state.db,
        XStreamConnection {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: user.id.clone(),
            playlist_id: playlist.id,
            name: playlist.name,
            server_address,
            username: connection_username(&user.id),
            password: generate_password(CONNECTION_PASSWORD_LEN),
            created_at: Utc::now(),
        },
    )
    .await?;

    tracing::info!(
        "Generated connection {} for playlist {} at {}",
        connection.id,
        connection.playlist_id,
        connection.server_address
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerateConnectionResponse {
            message: "XStream connection generated successfully".to_string(),
            server_address: connection.server_address,
            username: connection.username,
            password: connection.password,
        }),
    ))
}

/// GET /api/xstream/list
pub async fn list_connections(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<XStreamConnection>>, ApiError> {
    let connections = repository::connections::list_for_owner(&state.db, &user.id).await?;
    Ok(Json(connections))
}

/// GET /api/xstream/:id
pub async fn get_connection(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<XStreamConnection>, ApiError> {
    let connection = owned_connection(&state.db, &id, &user).await?;
    Ok(Json(connection))
}

/// DELETE /api/xstream/:id
pub async fn delete_connection(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    owned_connection(&state.db, &id, &user).await?;

    if !repository::connections::delete(&state.db, &id).await? {
        return Err(ApiError::NotFound("Connection not found".to_string()));
    }

    Ok(Json(MessageResponse::new("XStream connection deleted successfully")))
}

/// GET /player_api.php - Xtream Codes Player API for IPTV apps
///
/// Always 200 once authenticated. The query is read leniently: a repeated
/// key keeps its first value.
pub async fn player_api(
    State(state): State<Arc<AppState>>,
    XtreamUser(identity): XtreamUser,
    headers: HeaderMap,
    uri: Uri,
) -> Json<XtreamResponse> {
    let query = PlayerApiQuery::parse(uri.query());
    let request = XtreamRequest::from_query(&query);

    XTREAM_REQUESTS.with_label_values(&[request.kind()]).inc();
    tracing::info!("Player API {} for {}", request.kind(), identity.user.username);

    let ctx = RequestContext {
        host: header_str(&headers, HOST).unwrap_or("localhost").to_string(),
        port: state.config.port,
        secure: is_forwarded_https(&headers),
        now: Utc::now(),
    };

    Json(xtream::respond(&state.db, &identity, &request, &ctx).await)
}

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db::repository;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{AuthResponse, Credentials, ProfileResponse, User};
use crate::services::{auth, token};
use crate::AppState;

fn require_credentials(payload: &Credentials) -> Result<(String, String), ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required".to_string()));
    }
    Ok((username.to_string(), payload.password.clone()))
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    let token = token::issue(
        &state.config.jwt_secret,
        &user.id,
        &user.username,
        state.config.token_ttl_hours,
    )?;
    Ok(token)
}

/// POST /api/auth/register - Create an account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (username, password) = require_credentials(&payload)?;

    if repository::users::find_by_username(&state.db, &username).await?.is_some() {
        return Err(ApiError::BadRequest("Username already exists".to_string()));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        password_hash: auth::hash_password(&password, state.config.bcrypt_cost).await?,
        created_at: Utc::now(),
    };

    // Checked again under the index lock; a concurrent registration may have won
    if !repository::users::create(&state.db, user.clone()).await? {
        return Err(ApiError::BadRequest("Username already exists".to_string()));
    }

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.public(),
            token: issue_token(&state, &user)?,
        }),
    ))
}

/// POST /api/auth/login - Exchange credentials for a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (username, password) = require_credentials(&payload)?;
    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let user = repository::users::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(invalid)?;

    if !auth::verify_password(&password, &user.password_hash).await? {
        return Err(invalid());
    }

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: user.public(),
        token: issue_token(&state, &user)?,
    }))
}

/// GET /api/auth/verify - Check a bearer token
pub async fn verify(user: AuthUser) -> Json<Value> {
    Json(json!({
        "valid": true,
        "user": { "id": user.id, "username": user.username }
    }))
}

/// GET /api/auth/profile - Current user's profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = repository::users::find_by_id(&state.db, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        created_at: user.created_at,
    }))
}

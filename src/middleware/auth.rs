//! Request authentication extractors
//!
//! - [`AuthUser`]: `Authorization: Bearer <token>` for the JSON API
//! - [`XtreamUser`]: Basic auth or `username`/`password` query parameters for player apps

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::auth::{self, XtreamIdentity};
use crate::services::token;
use crate::services::xtream::PlayerApiQuery;
use crate::AppState;

/// Caller authenticated by bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

fn authorization(parts: &Parts) -> Option<&str> {
    parts.headers.get(AUTHORIZATION)?.to_str().ok()
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let bearer = authorization(parts)
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;

        let claims = token::verify(&state.config.jwt_secret, bearer).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            ApiError::Forbidden("Invalid or expired token".to_string())
        })?;

        Ok(Self {
            id: claims.id,
            username: claims.username,
        })
    }
}

/// Player app authenticated by connection or account credentials
#[derive(Debug, Clone)]
pub struct XtreamUser(pub XtreamIdentity);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for XtreamUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let credentials = match authorization(parts).and_then(auth::decode_basic_header) {
            Some(credentials) => Some(credentials),
            None => {
                let query = PlayerApiQuery::parse(parts.uri.query());
                query.username.zip(query.password)
            }
        };

        let Some((username, password)) = credentials else {
            return Err(ApiError::Unauthorized("Authentication required".to_string()));
        };

        match auth::resolve_basic(&state.db, &username, &password).await? {
            Some(identity) => Ok(Self(identity)),
            None => {
                tracing::info!("Player API login failed for {}", username);
                Err(ApiError::Unauthorized("Invalid credentials".to_string()))
            }
        }
    }
}

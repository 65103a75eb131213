//! Password hashing, generated credentials and XStream client authentication

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{distributions::Alphanumeric, Rng};

use crate::db::{repository, Db, StoreError};
use crate::models::{PublicUser, XStreamConnection};

/// Length of generated connection passwords
pub const CONNECTION_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hash a password with bcrypt off the async runtime
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Verify a password against a bcrypt hash. Malformed hashes never match.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false)).await?;
    Ok(matched)
}

/// Random alphanumeric password
pub fn generate_password(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Username handed out to a user's connections: `user_` plus the first 8 chars of their id
pub fn connection_username(user_id: &str) -> String {
    let prefix: String = user_id.chars().take(8).collect();
    format!("user_{}", prefix)
}

/// Decode an `Authorization: Basic ...` header value into `(username, password)`
pub fn decode_basic_header(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Authenticated XStream client
#[derive(Debug, Clone)]
pub struct XtreamIdentity {
    pub user: PublicUser,
    /// Connection used to log in, if the client used generated credentials
    pub connection: Option<XStreamConnection>,
}

impl XtreamIdentity {
    /// Connection password, empty for account logins
    pub fn password(&self) -> &str {
        self.connection
            .as_ref()
            .map(|c| c.password.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Resolve XStream credentials: generated connections first, then user accounts
pub async fn resolve_basic(
    db: &Db,
    username: &str,
    password: &str,
) -> Result<Option<XtreamIdentity>, ResolveError> {
    if let Some(connection) = repository::connections::find_by_credentials(db, username, password).await? {
        return match repository::users::find_by_id(db, &connection.owner_id).await? {
            Some(owner) => Ok(Some(XtreamIdentity {
                user: owner.public(),
                connection: Some(connection),
            })),
            None => {
                tracing::warn!("Connection {} has no owner", connection.id);
                Ok(None)
            }
        };
    }

    let Some(user) = repository::users::find_by_username(db, username).await? else {
        return Ok(None);
    };

    if verify_password(password, &user.password_hash).await? {
        Ok(Some(XtreamIdentity {
            user: user.public(),
            connection: None,
        }))
    } else {
        Ok(None)
    }
}

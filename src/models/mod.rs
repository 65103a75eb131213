pub mod connection;
pub mod playlist;
pub mod user;

pub use connection::{GenerateConnectionRequest, GenerateConnectionResponse, XStreamConnection};
pub use playlist::{Channel, ImportRequest, ImportResponse, PlaylistDetail, PlaylistMeta};
pub use user::{AuthResponse, Credentials, ProfileResponse, PublicUser, User};

use serde::Serialize;

/// Plain `{message}` body used by mutation endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

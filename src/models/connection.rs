use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generated credential set that lets an IPTV player read one playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XStreamConnection {
    pub id: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub playlist_id: String,
    /// Playlist name at generation time
    pub name: String,
    pub server_address: String,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// Request to generate a connection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConnectionRequest {
    #[serde(default)]
    pub playlist_id: Option<String>,
}

/// Response for a freshly generated connection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConnectionResponse {
    pub message: String,
    pub server_address: String,
    pub username: String,
    pub password: String,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group assigned to channels without a `group-title` attribute
pub const DEFAULT_GROUP: &str = "Uncategorized";

/// Title assigned to channels whose EXTINF line carries no usable name
pub const DEFAULT_TITLE: &str = "Unknown Channel";

/// Single channel parsed from an M3U playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub title: String,
    #[serde(rename = "logo", default)]
    pub logo_url: String,
    pub group: String,
    #[serde(rename = "url", default)]
    pub stream_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
}

impl Channel {
    /// Channels without a stream URL are never handed out to players
    pub fn is_playable(&self) -> bool {
        !self.stream_url.is_empty()
    }
}

/// Playlist index record (channels are stored separately under the playlist id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistMeta {
    pub id: String,
    pub name: String,
    #[serde(rename = "url")]
    pub source_url: String,
    pub channel_count: usize,
    pub imported_at: DateTime<Utc>,
    #[serde(rename = "userId")]
    pub owner_id: String,
}

/// Request to import a playlist
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Raw M3U text; when present no download happens
    #[serde(default)]
    pub content: Option<String>,
}

/// Import response
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub playlist: PlaylistMeta,
}

/// Playlist metadata together with its channels
#[derive(Debug, Serialize)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub meta: PlaylistMeta,
    pub channels: Vec<Channel>,
}

//! Xtream Codes API Types
//!
//! Query and response shapes of the Player API subset served to IPTV apps.

use serde::Serialize;

/// Query string accepted by `player_api.php`
#[derive(Debug, Default, Clone)]
pub struct PlayerApiQuery {
    /// `type` parameter
    pub kind: Option<String>,
    pub action: Option<String>,
    pub category_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl PlayerApiQuery {
    /// Parse a raw query string. A repeated key keeps its first value and
    /// unknown keys are ignored.
    pub fn parse(query: Option<&str>) -> Self {
        let mut parsed = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "type" => &mut parsed.kind,
                "action" => &mut parsed.action,
                "category_id" => &mut parsed.category_id,
                "username" => &mut parsed.username,
                "password" => &mut parsed.password,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        parsed
    }
}

// ============================================================================
// Authentication Response Types
// ============================================================================

/// Capability probe response (no type/action)
#[derive(Debug, Serialize, Clone)]
pub struct XtreamAuthResponse {
    pub user_info: XtreamUserInfo,
    pub server_info: XtreamServerInfo,
}

/// User account information
#[derive(Debug, Serialize, Clone)]
pub struct XtreamUserInfo {
    pub username: String,
    pub password: String,
    pub message: String,
    pub auth: u8,
    pub status: String,
    pub exp_date: String,
    pub is_trial: String,
    pub active_cons: String,
    pub created_at: String,
    pub max_connections: String,
    pub allowed_output_formats: Vec<String>,
}

/// Server information
#[derive(Debug, Serialize, Clone)]
pub struct XtreamServerInfo {
    pub url: String,
    pub port: String,
    pub https_port: String,
    pub server_protocol: String,
    pub rtmp_port: String,
    pub timezone: String,
    pub timestamp_now: i64,
    pub time_now: String,
}

// ============================================================================
// Category Types
// ============================================================================

/// Live category
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct XtreamCategory {
    pub category_id: String,
    pub category_name: String,
    pub parent_id: u32,
}

// ============================================================================
// Live Stream Types
// ============================================================================

/// Live stream (channel) entry
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct XtreamLiveStream {
    pub num: usize,
    pub name: String,
    pub stream_type: String,
    pub stream_id: usize,
    pub stream_icon: String,
    pub epg_channel_id: String,
    pub added: String,
    pub category_id: String,
    pub custom_sid: String,
    pub tv_archive: u8,
    pub direct_source: String,
    pub tv_archive_duration: u32,
}

//! Player API emulation
//!
//! Maps a `player_api.php` query onto a typed request and answers it from the
//! caller's playlist. Lookup failures degrade to empty payloads: player apps
//! have no error channel they handle gracefully.

use chrono::{DateTime, Months, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::types::{
    PlayerApiQuery, XtreamAuthResponse, XtreamCategory, XtreamLiveStream, XtreamServerInfo, XtreamUserInfo,
};
use crate::db::{repository, Db};
use crate::models::Channel;
use crate::services::auth::XtreamIdentity;
use crate::services::category_index::CategoryIndex;

const GET_LIVE_CATEGORIES: &str = "get_live_categories";
const GET_LIVE_STREAMS: &str = "get_live_streams";
const GET_VOD_CATEGORIES: &str = "get_vod_categories";
const GET_VOD_STREAMS: &str = "get_vod_streams";
const GET_VOD_INFO: &str = "get_vod_info";
const GET_SHORT_EPG: &str = "get_short_epg";
const GET_SIMPLE_DATA_TABLE: &str = "get_simple_data_table";

/// `action` values that are dispatched exactly like the same `type`
const ACTION_ALIASES: [&str; 7] = [
    GET_LIVE_CATEGORIES,
    GET_LIVE_STREAMS,
    GET_VOD_CATEGORIES,
    GET_VOD_STREAMS,
    GET_VOD_INFO,
    GET_SHORT_EPG,
    GET_SIMPLE_DATA_TABLE,
];

const ALLOWED_OUTPUT_FORMATS: [&str; 3] = ["m3u8", "ts", "rtmp"];
const HTTPS_PORT: &str = "443";
const RTMP_PORT: &str = "1935";
const TIMEZONE: &str = "Europe/London";

/// Player API request after alias resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XtreamRequest {
    /// No `type` or `action`: the login/capability probe
    Probe,
    LiveCategories,
    LiveStreams { category_id: Option<String> },
    VodCategories,
    VodStreams,
    VodInfo,
    ShortEpg,
    SimpleDataTable,
    UnknownAction(String),
    UnknownType(String),
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl XtreamRequest {
    pub fn from_query(query: &PlayerApiQuery) -> Self {
        let category_id = non_empty(&query.category_id).map(str::to_string);

        if let Some(action) = non_empty(&query.action) {
            if !ACTION_ALIASES.contains(&action) {
                return Self::UnknownAction(action.to_string());
            }
            return Self::typed(action, category_id);
        }

        match non_empty(&query.kind) {
            Some(kind) => Self::typed(kind, category_id),
            None => Self::Probe,
        }
    }

    fn typed(kind: &str, category_id: Option<String>) -> Self {
        match kind {
            GET_LIVE_CATEGORIES => Self::LiveCategories,
            GET_LIVE_STREAMS => Self::LiveStreams { category_id },
            GET_VOD_CATEGORIES => Self::VodCategories,
            GET_VOD_STREAMS => Self::VodStreams,
            GET_VOD_INFO => Self::VodInfo,
            GET_SHORT_EPG => Self::ShortEpg,
            GET_SIMPLE_DATA_TABLE => Self::SimpleDataTable,
            other => Self::UnknownType(other.to_string()),
        }
    }

    /// Metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::LiveCategories => GET_LIVE_CATEGORIES,
            Self::LiveStreams { .. } => GET_LIVE_STREAMS,
            Self::VodCategories => GET_VOD_CATEGORIES,
            Self::VodStreams => GET_VOD_STREAMS,
            Self::VodInfo => GET_VOD_INFO,
            Self::ShortEpg => GET_SHORT_EPG,
            Self::SimpleDataTable => GET_SIMPLE_DATA_TABLE,
            Self::UnknownAction(_) => "unknown_action",
            Self::UnknownType(_) => "unknown_type",
        }
    }
}

/// Request facts echoed in the probe response
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    fn today(&self) -> String {
        self.now.format("%Y-%m-%d").to_string()
    }
}

/// Player API response body
#[derive(Debug, Clone)]
pub enum XtreamResponse {
    Probe(Box<XtreamAuthResponse>),
    Categories(Vec<XtreamCategory>),
    Streams(Vec<XtreamLiveStream>),
    EmptyList,
    EmptyObject,
    /// `{<key>: <value>, "status": "ok"}` for unrecognized requests
    Acknowledge { key: &'static str, value: String },
}

impl Serialize for XtreamResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Probe(probe) => probe.serialize(serializer),
            Self::Categories(categories) => categories.serialize(serializer),
            Self::Streams(streams) => streams.serialize(serializer),
            Self::EmptyList => serializer.serialize_seq(Some(0))?.end(),
            Self::EmptyObject => serializer.serialize_map(Some(0))?.end(),
            Self::Acknowledge { key, value } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(key, value)?;
                map.serialize_entry("status", "ok")?;
                map.end()
            }
        }
    }
}

/// Answer a Player API request for an authenticated client
pub async fn respond(
    db: &Db,
    identity: &XtreamIdentity,
    request: &XtreamRequest,
    ctx: &RequestContext,
) -> XtreamResponse {
    match request {
        XtreamRequest::Probe => XtreamResponse::Probe(Box::new(probe(identity, ctx))),
        XtreamRequest::LiveCategories => {
            let channels = load_channels(db, identity).await;
            let index = CategoryIndex::build(&channels);
            tracing::debug!("Derived {} categories from {} channels", index.len(), channels.len());
            XtreamResponse::Categories(live_categories(&index))
        }
        XtreamRequest::LiveStreams { category_id } => {
            let channels = load_channels(db, identity).await;
            let index = CategoryIndex::build(&channels);
            XtreamResponse::Streams(live_streams(&channels, &index, category_id.as_deref(), &ctx.today()))
        }
        XtreamRequest::VodCategories | XtreamRequest::VodStreams | XtreamRequest::SimpleDataTable => {
            XtreamResponse::EmptyList
        }
        XtreamRequest::VodInfo | XtreamRequest::ShortEpg => XtreamResponse::EmptyObject,
        XtreamRequest::UnknownAction(action) => XtreamResponse::Acknowledge {
            key: "action",
            value: action.clone(),
        },
        XtreamRequest::UnknownType(kind) => XtreamResponse::Acknowledge {
            key: "type",
            value: kind.clone(),
        },
    }
}

fn probe(identity: &XtreamIdentity, ctx: &RequestContext) -> XtreamAuthResponse {
    let today = ctx.now.date_naive();
    let exp_date = today.checked_add_months(Months::new(12)).unwrap_or(today);

    XtreamAuthResponse {
        user_info: XtreamUserInfo {
            username: identity.user.username.clone(),
            password: identity.password().to_string(),
            message: String::new(),
            auth: 1,
            status: "Active".to_string(),
            exp_date: exp_date.format("%Y-%m-%d").to_string(),
            is_trial: "0".to_string(),
            active_cons: "1".to_string(),
            created_at: ctx.today(),
            max_connections: "1".to_string(),
            allowed_output_formats: ALLOWED_OUTPUT_FORMATS.iter().map(|f| f.to_string()).collect(),
        },
        server_info: XtreamServerInfo {
            url: ctx.host.clone(),
            port: ctx.port.to_string(),
            https_port: HTTPS_PORT.to_string(),
            server_protocol: if ctx.secure { "https" } else { "http" }.to_string(),
            rtmp_port: RTMP_PORT.to_string(),
            timezone: TIMEZONE.to_string(),
            timestamp_now: ctx.now.timestamp(),
            time_now: ctx.now.to_rfc3339_opts(SecondsFormat::Millis, true),
        },
    }
}

/// Channels backing this client: the connection's playlist, else the user's first playlist
async fn load_channels(db: &Db, identity: &XtreamIdentity) -> Vec<Channel> {
    if let Some(connection) = &identity.connection {
        match repository::playlists::get_channels(db, &connection.playlist_id).await {
            Ok(Some(channels)) => {
                tracing::debug!("Loaded {} channels from playlist {}", channels.len(), connection.playlist_id);
                return channels;
            }
            Ok(None) => {
                tracing::warn!(
                    "Playlist {} of connection {} is gone, using first owned playlist",
                    connection.playlist_id,
                    connection.id
                );
            }
            Err(e) => {
                tracing::warn!("Failed to load playlist {}: {}", connection.playlist_id, e);
                return Vec::new();
            }
        }
    }

    let playlist_id = match repository::playlists::list_for_owner(db, &identity.user.id).await {
        Ok(playlists) => match playlists.into_iter().next() {
            Some(playlist) => playlist.id,
            None => {
                tracing::warn!("No playlists for user {}", identity.user.id);
                return Vec::new();
            }
        },
        Err(e) => {
            tracing::warn!("Failed to list playlists for user {}: {}", identity.user.id, e);
            return Vec::new();
        }
    };

    match repository::playlists::get_channels(db, &playlist_id).await {
        Ok(Some(channels)) => {
            tracing::debug!("Loaded {} channels from playlist {}", channels.len(), playlist_id);
            channels
        }
        Ok(None) => {
            tracing::warn!("Playlist content missing: {}", playlist_id);
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Failed to load playlist {}: {}", playlist_id, e);
            Vec::new()
        }
    }
}

/// Categories in id order
pub fn live_categories(index: &CategoryIndex) -> Vec<XtreamCategory> {
    index
        .iter()
        .map(|(id, name)| XtreamCategory {
            category_id: id,
            category_name: name.to_string(),
            parent_id: 0,
        })
        .collect()
}

/// Playable channels, optionally limited to one category.
///
/// `category_id` is looked up in the index; an id the index does not know is
/// compared literally against each channel's group. `num` and `stream_id`
/// are 1-based positions in the filtered list.
pub fn live_streams(
    channels: &[Channel],
    index: &CategoryIndex,
    category_id: Option<&str>,
    added: &str,
) -> Vec<XtreamLiveStream> {
    let wanted_group = category_id.map(|id| index.name_of(id).unwrap_or(id));

    channels
        .iter()
        .filter(|channel| channel.is_playable())
        .filter(|channel| wanted_group.map_or(true, |group| channel.group == group))
        .enumerate()
        .map(|(i, channel)| XtreamLiveStream {
            num: i + 1,
            name: channel.title.clone(),
            stream_type: "live".to_string(),
            stream_id: i + 1,
            stream_icon: channel.logo_url.clone(),
            epg_channel_id: channel.title.clone(),
            added: added.to_string(),
            category_id: index.id_of(&channel.group).unwrap_or_default().to_string(),
            custom_sid: String::new(),
            tv_archive: 0,
            direct_source: channel.stream_url.clone(),
            tv_archive_duration: 0,
        })
        .collect()
}

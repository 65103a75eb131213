use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub node_env: String,

    // Storage
    pub data_dir: String,

    // Auth
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub bcrypt_cost: u32,

    // Playlist download
    pub fetch_timeout_ms: u64,
    pub max_m3u_size_mb: usize,
    pub max_retries: u32,
    pub user_agent: String,

    // Advertised server address
    pub railway_static_url: Option<String>,
    pub railway_public_domain: Option<String>,
    pub server_address: Option<String>,
    pub host: Option<String>,
    pub https: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from any variable source; unset or unparsable values fall back to defaults
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        Self {
            // Server
            port: var("PORT").and_then(|v| v.parse().ok()).unwrap_or(3000),
            node_env: var("NODE_ENV").unwrap_or_else(|| "development".to_string()),

            // Storage
            data_dir: var("DATA_DIR").unwrap_or_else(|| "data".to_string()),

            // Auth
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| "xstream_secret_key".to_string()),
            token_ttl_hours: var("TOKEN_TTL_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(168), // 7 days
            bcrypt_cost: var("BCRYPT_COST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            // Playlist download
            fetch_timeout_ms: var("FETCH_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000), // 30 seconds
            max_m3u_size_mb: var("MAX_M3U_SIZE_MB")
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            max_retries: var("MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            // Use VLC user agent to avoid IPTV server blocks
            user_agent: var("USER_AGENT").unwrap_or_else(|| "VLC/3.0.20 LibVLC/3.0.20".to_string()),

            // Advertised server address
            railway_static_url: non_empty("RAILWAY_STATIC_URL"),
            railway_public_domain: non_empty("RAILWAY_PUBLIC_DOMAIN"),
            server_address: non_empty("SERVER_ADDRESS"),
            host: non_empty("HOST"),
            https: var("HTTPS").map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

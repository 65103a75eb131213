use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Player API requests by resolved request kind
    pub static ref XTREAM_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "xstream_requests_total",
        "Player API requests by kind",
        &["kind"]
    )
    .unwrap();

    /// Playlist imports by outcome
    pub static ref PLAYLIST_IMPORTS: IntCounterVec = register_int_counter_vec!(
        "playlist_imports_total",
        "Playlist imports by outcome",
        &["outcome"]
    )
    .unwrap();
}

//! Xtream Codes Player API emulation
//!
//! Serves imported playlists to IPTV apps:
//! - Capability probe (login)
//! - Live categories and live streams derived from the playlist groups
//! - Empty VOD/EPG answers so apps never see an error

pub mod responder;
pub mod types;

pub use responder::{respond, RequestContext, XtreamRequest, XtreamResponse};
pub use types::PlayerApiQuery;

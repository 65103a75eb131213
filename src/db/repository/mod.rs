//! Store repositories
//!
//! Repository pattern for record access, separating the storage layout
//! from request handling.

pub mod connections;
pub mod playlists;
pub mod users;

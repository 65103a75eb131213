pub mod auth;
pub mod health;
pub mod playlist;
pub mod xtream;

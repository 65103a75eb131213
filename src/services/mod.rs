pub mod auth;
pub mod category_index;
pub mod fetcher;
pub mod m3u_parser;
pub mod server_address;
pub mod token;
pub mod xtream;

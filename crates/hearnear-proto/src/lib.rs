pub mod api;
pub mod config;
pub mod platform;
pub mod prefs;
pub mod protocol;
pub mod session;

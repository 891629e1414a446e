//! Wire types for the HearNear backend HTTP API (JSON over HTTPS).
//!
//! Field names follow the server's snake_case JSON exactly, so these structs
//! serialize/deserialize without rename attributes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub nick: String,
    pub email: String,
    pub password: String,
    pub terms_accepted: bool,
}

/// A user profile as returned by the server.  `id` and `email` are immutable
/// after creation; instagram and avatar fields are mutated via dedicated
/// endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub nick: String,
    pub email: String,
    #[serde(default)]
    pub instagram_username: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenVerifyResponse {
    pub valid: bool,
    pub user: User,
}

/// JSON error envelope the server attaches to non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramRequest {
    pub instagram_username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramResponse {
    pub message: String,
    pub instagram_username: Option<String>,
    pub instagram_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarResponse {
    pub message: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateActivityRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub track_name: String,
    pub artist_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,
}

/// Server-confirmed merge of a music sample and a location fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityData {
    pub latitude: f64,
    pub longitude: f64,
    pub track_name: String,
    pub artist_name: String,
    #[serde(default)]
    pub album_name: Option<String>,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub message: String,
    pub activity: ActivityData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyListener {
    pub email: String,
    pub nick: String,
    pub distance_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub track_name: String,
    pub artist_name: String,
    #[serde(default)]
    pub album_name: Option<String>,
    pub last_updated: String,
    pub minutes_ago: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyListenersResponse {
    pub listeners: Vec<NearbyListener>,
    pub total_count: usize,
    pub search_params: SearchParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    pub max_distance_km: f64,
    pub max_age_minutes: u32,
    pub your_location: YourLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YourLocation {
    pub latitude: f64,
    pub longitude: f64,
}

//! Typed HTTP client for the HearNear backend.
//!
//! One method per server capability, a single request/response exchange each.
//! Authenticated calls attach the session token as a bearer credential.
//! Non-2xx responses are decoded from the `{"error": ...}` envelope with a
//! typed fallback; transport failures map to `ClientError::Network`.  No
//! automatic retry — every failure is surfaced to the caller.

use crate::error::ClientError;
use hearnear_proto::api::{
    ActivityResponse, ApiErrorBody, AuthResponse, AvatarResponse, InstagramRequest,
    InstagramResponse, LoginRequest, NearbyListenersResponse, RegisterRequest,
    TokenVerifyResponse, UpdateActivityRequest,
};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
}

impl Gateway {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("hearnear-daemon/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .http
            .post(self.url("/api/login"))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        decode(resp, "Login failed").await
    }

    pub async fn register(
        &self,
        nick: &str,
        email: &str,
        password: &str,
        terms_accepted: bool,
    ) -> Result<AuthResponse, ClientError> {
        let body = RegisterRequest {
            nick: nick.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            terms_accepted,
        };
        let resp = self
            .http
            .post(self.url("/api/register"))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        decode(resp, "Registration failed").await
    }

    pub async fn verify_token(&self, token: &str) -> Result<TokenVerifyResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/verify-token"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        decode(resp, "Token verification failed").await
    }

    /// Best-effort: callers are expected to ignore the result.
    pub async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("/api/logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(rejection(resp, "Logout failed").await)
        }
    }

    pub async fn update_activity(
        &self,
        token: &str,
        request: &UpdateActivityRequest,
    ) -> Result<ActivityResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/update-activity"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        decode(resp, "Failed to update activity").await
    }

    pub async fn nearby_listeners(
        &self,
        token: &str,
        max_distance_km: f64,
        max_age_minutes: u32,
    ) -> Result<NearbyListenersResponse, ClientError> {
        let resp = self
            .http
            .get(self.url("/api/nearby-listeners"))
            .bearer_auth(token)
            .query(&[
                ("max_distance", max_distance_km.to_string()),
                ("max_age_minutes", max_age_minutes.to_string()),
            ])
            .send()
            .await
            .map_err(transport)?;
        decode(resp, "Failed to load nearby listeners").await
    }

    pub async fn update_instagram(
        &self,
        token: &str,
        instagram_username: Option<String>,
    ) -> Result<InstagramResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/instagram"))
            .bearer_auth(token)
            .json(&InstagramRequest { instagram_username })
            .send()
            .await
            .map_err(transport)?;
        decode(resp, "Failed to update instagram handle").await
    }

    /// Upload the avatar image as the single multipart file part.
    pub async fn upload_avatar(
        &self,
        token: &str,
        path: &Path,
    ) -> Result<AvatarResponse, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Validation(format!("Cannot read avatar file: {}", e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "avatar.jpg".to_string());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("avatar", part);
        let resp = self
            .http
            .post(self.url("/api/avatar"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        decode(resp, "Avatar upload failed").await
    }

    pub async fn delete_avatar(&self, token: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url("/api/avatar"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(rejection(resp, "Avatar deletion failed").await)
        }
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Network(e.to_string())
}

/// Decode a 2xx body as `T`, or turn a non-2xx response into a rejection
/// with the server's error envelope when it parses and `fallback` when it
/// does not.  Parse failures of a 2xx body are transport-class: the server
/// accepted the request but the response is unusable.
async fn decode<T: DeserializeOwned>(
    resp: reqwest::Response,
    fallback: &str,
) -> Result<T, ClientError> {
    if resp.status().is_success() {
        resp.json::<T>().await.map_err(transport)
    } else {
        Err(rejection(resp, fallback).await)
    }
}

async fn rejection(resp: reqwest::Response, fallback: &str) -> ClientError {
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or_else(|_| fallback.to_string());
    ClientError::Rejected(message)
}

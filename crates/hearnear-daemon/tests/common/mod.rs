//! In-process mock of the HearNear backend for integration tests.
//!
//! Serves the real wire shapes on an ephemeral port and records what it was
//! asked, so tests can assert on exact call counts and payloads.

#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use hearnear_proto::api::{
    ActivityData, ActivityResponse, ApiErrorBody, AuthResponse, InstagramResponse,
    NearbyListener, NearbyListenersResponse, SearchParams, TokenVerifyResponse,
    UpdateActivityRequest, User, YourLocation,
};
use hearnear_daemon::gateway::Gateway;
use hearnear_daemon::session::SessionMachine;
use hearnear_proto::session::SessionStore;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const VALID_EMAIL: &str = "kuba@example.com";
pub const VALID_PASSWORD: &str = "secret1";
pub const ISSUED_TOKEN: &str = "tok-1";

pub struct MockBackend {
    pub base_url: String,
    state: Arc<BackendState>,
}

struct BackendState {
    valid_tokens: Mutex<Vec<String>>,
    listeners: Mutex<Vec<NearbyListener>>,
    activity_calls: AtomicUsize,
    nearby_calls: AtomicUsize,
    last_activity: Mutex<Option<UpdateActivityRequest>>,
    fail_logout: AtomicBool,
    fail_nearby: AtomicBool,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState {
            valid_tokens: Mutex::new(vec![ISSUED_TOKEN.to_string()]),
            listeners: Mutex::new(Vec::new()),
            activity_calls: AtomicUsize::new(0),
            nearby_calls: AtomicUsize::new(0),
            last_activity: Mutex::new(None),
            fail_logout: AtomicBool::new(false),
            fail_nearby: AtomicBool::new(false),
        });

        let app = Router::new()
            .route("/api/login", post(login))
            .route("/api/register", post(register))
            .route("/api/verify-token", post(verify_token))
            .route("/api/logout", post(logout))
            .route("/api/update-activity", post(update_activity))
            .route("/api/nearby-listeners", get(nearby_listeners))
            .route("/api/instagram", post(instagram))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn activity_calls(&self) -> usize {
        self.state.activity_calls.load(Ordering::SeqCst)
    }

    pub fn nearby_calls(&self) -> usize {
        self.state.nearby_calls.load(Ordering::SeqCst)
    }

    pub fn last_activity(&self) -> Option<UpdateActivityRequest> {
        self.state.last_activity.lock().unwrap().clone()
    }

    pub fn set_listeners(&self, listeners: Vec<NearbyListener>) {
        *self.state.listeners.lock().unwrap() = listeners;
    }

    pub fn set_fail_logout(&self, fail: bool) {
        self.state.fail_logout.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_nearby(&self, fail: bool) {
        self.state.fail_nearby.store(fail, Ordering::SeqCst);
    }

    pub fn revoke_all_tokens(&self) {
        self.state.valid_tokens.lock().unwrap().clear();
    }
}

pub fn gateway(backend: &MockBackend) -> Gateway {
    Gateway::new(backend.base_url.clone(), Duration::from_secs(5)).unwrap()
}

pub fn session_machine(backend: &MockBackend, dir: &std::path::Path) -> Arc<SessionMachine> {
    Arc::new(SessionMachine::new(
        gateway(backend),
        SessionStore::new(dir.join("session.json")),
    ))
}

/// A machine already logged in against the mock backend.
pub async fn logged_in_session(
    backend: &MockBackend,
    dir: &std::path::Path,
) -> Arc<SessionMachine> {
    let session = session_machine(backend, dir);
    session.login(VALID_EMAIL, VALID_PASSWORD).await.unwrap();
    assert!(session.snapshot().await.is_authenticated());
    session
}

pub fn sample_user() -> User {
    User {
        id: 1,
        nick: "kuba".to_string(),
        email: VALID_EMAIL.to_string(),
        instagram_username: None,
        instagram_url: None,
        avatar_url: None,
    }
}

pub fn sample_listener(nick: &str) -> NearbyListener {
    NearbyListener {
        email: format!("{}@example.com", nick),
        nick: nick.to_string(),
        distance_km: 1.5,
        latitude: 52.1,
        longitude: 21.0,
        track_name: "Track".to_string(),
        artist_name: "Artist".to_string(),
        album_name: None,
        last_updated: "2026-08-01 10:00:00".to_string(),
        minutes_ago: 2,
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.to_string())
}

fn authorized(state: &BackendState, headers: &HeaderMap) -> bool {
    match bearer_token(headers) {
        Some(token) => state.valid_tokens.lock().unwrap().contains(&token),
        None => false,
    }
}

fn unauthorized() -> (StatusCode, Json<ApiErrorBody>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiErrorBody {
            error: "Invalid or missing token".to_string(),
        }),
    )
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ApiErrorBody>)> {
    if body.email == VALID_EMAIL && body.password == VALID_PASSWORD {
        state
            .valid_tokens
            .lock()
            .unwrap()
            .push(ISSUED_TOKEN.to_string());
        Ok(Json(AuthResponse {
            message: "Login successful".to_string(),
            token: ISSUED_TOKEN.to_string(),
            user: sample_user(),
        }))
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiErrorBody {
                error: "Invalid credentials".to_string(),
            }),
        ))
    }
}

#[derive(Deserialize)]
struct RegisterBody {
    nick: String,
    email: String,
    #[allow(dead_code)]
    password: String,
    #[allow(dead_code)]
    terms_accepted: bool,
}

async fn register(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ApiErrorBody>)> {
    if body.email == "taken@example.com" {
        return Err((
            StatusCode::CONFLICT,
            Json(ApiErrorBody {
                error: "Email already registered".to_string(),
            }),
        ));
    }
    let token = format!("tok-{}", body.nick);
    state.valid_tokens.lock().unwrap().push(token.clone());
    Ok(Json(AuthResponse {
        message: "Registration successful".to_string(),
        token,
        user: User {
            id: 2,
            nick: body.nick,
            email: body.email,
            instagram_username: None,
            instagram_url: None,
            avatar_url: None,
        },
    }))
}

async fn verify_token(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> Result<Json<TokenVerifyResponse>, (StatusCode, Json<ApiErrorBody>)> {
    if authorized(&state, &headers) {
        Ok(Json(TokenVerifyResponse {
            valid: true,
            user: sample_user(),
        }))
    } else {
        Err(unauthorized())
    }
}

async fn logout(
    State(state): State<Arc<BackendState>>,
) -> Result<StatusCode, (StatusCode, Json<ApiErrorBody>)> {
    if state.fail_logout.load(Ordering::SeqCst) {
        Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorBody {
                error: "Server exploded".to_string(),
            }),
        ))
    } else {
        Ok(StatusCode::OK)
    }
}

async fn update_activity(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateActivityRequest>,
) -> Result<Json<ActivityResponse>, (StatusCode, Json<ApiErrorBody>)> {
    if !authorized(&state, &headers) {
        return Err(unauthorized());
    }
    state.activity_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_activity.lock().unwrap() = Some(body.clone());
    Ok(Json(ActivityResponse {
        message: "Activity updated".to_string(),
        activity: ActivityData {
            latitude: body.latitude,
            longitude: body.longitude,
            track_name: body.track_name,
            artist_name: body.artist_name,
            album_name: body.album_name,
            last_updated: "2026-08-01 10:00:00".to_string(),
        },
    }))
}

async fn nearby_listeners(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<NearbyListenersResponse>, (StatusCode, Json<ApiErrorBody>)> {
    if !authorized(&state, &headers) {
        return Err(unauthorized());
    }
    state.nearby_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_nearby.load(Ordering::SeqCst) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorBody {
                error: "Nearby lookup failed".to_string(),
            }),
        ));
    }
    let max_distance_km = params
        .get("max_distance")
        .and_then(|v| v.parse().ok())
        .unwrap_or(50.0);
    let max_age_minutes = params
        .get("max_age_minutes")
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);
    let listeners = state.listeners.lock().unwrap().clone();
    let total_count = listeners.len();
    Ok(Json(NearbyListenersResponse {
        listeners,
        total_count,
        search_params: SearchParams {
            max_distance_km,
            max_age_minutes,
            your_location: YourLocation {
                latitude: 52.0,
                longitude: 21.0,
            },
        },
    }))
}

#[derive(Deserialize)]
struct InstagramBody {
    instagram_username: Option<String>,
}

async fn instagram(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<InstagramBody>,
) -> Result<Json<InstagramResponse>, (StatusCode, Json<ApiErrorBody>)> {
    if !authorized(&state, &headers) {
        return Err(unauthorized());
    }
    let url = body
        .instagram_username
        .as_ref()
        .map(|u| format!("https://instagram.com/{}", u));
    Ok(Json(InstagramResponse {
        message: "Instagram updated".to_string(),
        instagram_username: body.instagram_username,
        instagram_url: url,
    }))
}

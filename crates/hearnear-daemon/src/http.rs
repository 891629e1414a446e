//! Local HTTP control API — the seam a UI (or curl) talks to.
//!
//! User-triggered operations (login, register, sharing toggle, nearby
//! refresh, profile edits) enter the daemon here; background components
//! never depend on this surface being used.

use crate::core::DaemonEvent;
use crate::error::ClientError;
use crate::poller::NearbyPoller;
use crate::session::{AuthState, SessionMachine};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use hearnear_proto::api::{ActivityData, ApiErrorBody, NearbyListener, User};
use hearnear_proto::prefs::{NowPlaying, Prefs};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct HttpState {
    pub session: Arc<SessionMachine>,
    pub poller: Arc<NearbyPoller>,
    pub prefs: Arc<RwLock<Prefs>>,
    pub last_activity: Arc<RwLock<Option<ActivityData>>>,
    pub event_tx: mpsc::Sender<DaemonEvent>,
}

#[derive(Serialize)]
struct StateView {
    auth: AuthView,
    sharing_enabled: bool,
    now_playing: Option<NowPlaying>,
    last_activity: Option<ActivityData>,
}

#[derive(Serialize)]
struct AuthView {
    phase: &'static str,
    user: Option<User>,
    error: Option<String>,
}

impl AuthView {
    fn from_state(state: AuthState) -> Self {
        match state {
            AuthState::Unauthenticated => AuthView {
                phase: "unauthenticated",
                user: None,
                error: None,
            },
            AuthState::Authenticating => AuthView {
                phase: "authenticating",
                user: None,
                error: None,
            },
            AuthState::Authenticated(session) => AuthView {
                phase: "authenticated",
                user: Some(session.user),
                error: None,
            },
            AuthState::AuthError(message) => AuthView {
                phase: "error",
                user: None,
                error: Some(message),
            },
        }
    }
}

#[derive(Serialize)]
struct NearbyView {
    listeners: Vec<NearbyListener>,
    error: Option<String>,
    last_refresh: Option<String>,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    nick: String,
    email: String,
    password: String,
    confirm_password: String,
    terms_accepted: bool,
}

#[derive(Deserialize)]
struct InstagramBody {
    instagram_username: Option<String>,
}

#[derive(Deserialize)]
struct AvatarBody {
    path: String,
}

pub fn start_server(
    bind_address: String,
    port: u16,
    state: HttpState,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(state);
        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind control API to {}: {}", addr, e);
                return;
            }
        };

        info!("Control API listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("Control API server error: {}", e);
        }
    })
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/sharing/:flag", post(set_sharing))
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/logout", post(logout))
        .route("/api/clear-error", post(clear_error))
        .route("/api/nearby", get(get_nearby))
        .route("/api/nearby/refresh", post(refresh_nearby))
        .route("/api/instagram", post(set_instagram))
        .route("/api/avatar", post(upload_avatar).delete(delete_avatar))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_state(State(state): State<HttpState>) -> Json<StateView> {
    let auth = AuthView::from_state(state.session.snapshot().await);
    let prefs = state.prefs.read().await.clone();
    let last_activity = state.last_activity.read().await.clone();
    Json(StateView {
        auth,
        sharing_enabled: prefs.sharing_enabled,
        now_playing: prefs.now_playing,
        last_activity,
    })
}

async fn set_sharing(
    State(state): State<HttpState>,
    Path(flag): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiErrorBody>)> {
    let enabled = match flag.as_str() {
        "on" => true,
        "off" => false,
        _ => {
            return Err(reject(
                StatusCode::BAD_REQUEST,
                "Sharing flag must be 'on' or 'off'",
            ))
        }
    };
    info!("Control API: sharing {}", flag);
    if state
        .event_tx
        .send(DaemonEvent::SetSharing(enabled))
        .await
        .is_err()
    {
        error!("Failed to send sharing toggle");
        return Err(reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Daemon event loop unavailable",
        ));
    }
    Ok(StatusCode::OK)
}

async fn login(
    State(state): State<HttpState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<StateView>, (StatusCode, Json<ApiErrorBody>)> {
    state
        .session
        .login(&body.email, &body.password)
        .await
        .map_err(client_error)?;
    Ok(get_state(State(state)).await)
}

async fn register(
    State(state): State<HttpState>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<StateView>, (StatusCode, Json<ApiErrorBody>)> {
    state
        .session
        .register(
            &body.nick,
            &body.email,
            &body.password,
            &body.confirm_password,
            body.terms_accepted,
        )
        .await
        .map_err(client_error)?;
    Ok(get_state(State(state)).await)
}

async fn logout(State(state): State<HttpState>) -> StatusCode {
    state.session.logout().await;
    StatusCode::OK
}

async fn clear_error(State(state): State<HttpState>) -> StatusCode {
    state.session.clear_error().await;
    StatusCode::OK
}

async fn get_nearby(State(state): State<HttpState>) -> Json<NearbyView> {
    let nearby = state.poller.snapshot().await;
    Json(NearbyView {
        listeners: nearby.listeners,
        error: nearby.error,
        last_refresh: nearby.last_refresh.map(|t| t.to_rfc3339()),
    })
}

async fn refresh_nearby(State(state): State<HttpState>) -> Json<NearbyView> {
    state.poller.load_defaults().await;
    get_nearby(State(state)).await
}

async fn set_instagram(
    State(state): State<HttpState>,
    Json(body): Json<InstagramBody>,
) -> Result<Json<StateView>, (StatusCode, Json<ApiErrorBody>)> {
    state
        .session
        .set_instagram(body.instagram_username)
        .await
        .map_err(client_error)?;
    Ok(get_state(State(state)).await)
}

async fn upload_avatar(
    State(state): State<HttpState>,
    Json(body): Json<AvatarBody>,
) -> Result<Json<StateView>, (StatusCode, Json<ApiErrorBody>)> {
    state
        .session
        .upload_avatar(std::path::Path::new(&body.path))
        .await
        .map_err(client_error)?;
    Ok(get_state(State(state)).await)
}

async fn delete_avatar(
    State(state): State<HttpState>,
) -> Result<Json<StateView>, (StatusCode, Json<ApiErrorBody>)> {
    state.session.delete_avatar().await.map_err(client_error)?;
    Ok(get_state(State(state)).await)
}

fn client_error(e: ClientError) -> (StatusCode, Json<ApiErrorBody>) {
    let status = match &e {
        ClientError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ClientError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ClientError::Rejected(_) => StatusCode::BAD_REQUEST,
        ClientError::Network(_) => StatusCode::BAD_GATEWAY,
        ClientError::PermissionDenied => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ApiErrorBody {
            error: e.user_message(),
        }),
    )
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<ApiErrorBody>) {
    (
        status,
        Json(ApiErrorBody {
            error: message.to_string(),
        }),
    )
}

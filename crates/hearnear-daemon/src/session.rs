//! Client-side auth/session state machine.
//!
//! States move `Unauthenticated -> Authenticating -> Authenticated` on
//! gateway success and `-> AuthError` on rejection or transport failure.
//! Every transition replaces the whole state under the lock, so observers
//! only ever see complete states.  Field-level validation gates whether a
//! submit is dispatched at all; validation failures are returned to the
//! caller and never enter the state machine.

use crate::error::ClientError;
use crate::gateway::Gateway;
use hearnear_proto::api::User;
use hearnear_proto::session::{Session, SessionStore};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(Session),
    AuthError(String),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

pub struct SessionMachine {
    state: Arc<RwLock<AuthState>>,
    store: SessionStore,
    gateway: Gateway,
}

impl SessionMachine {
    pub fn new(gateway: Gateway, store: SessionStore) -> Self {
        Self {
            state: Arc::new(RwLock::new(AuthState::Unauthenticated)),
            store,
            gateway,
        }
    }

    pub async fn snapshot(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        match &*self.state.read().await {
            AuthState::Authenticated(session) => Some(session.token.clone()),
            _ => None,
        }
    }

    /// Silent background reconciliation on process start: if a session is
    /// persisted, verify its token remotely.  Success lands `Authenticated`
    /// with the refreshed user; anything else clears the store and settles
    /// at `Unauthenticated` without surfacing an error.
    pub async fn verify_on_start(&self) {
        let Some(session) = self.store.load() else {
            debug!("No persisted session");
            return;
        };
        match self.gateway.verify_token(&session.token).await {
            Ok(resp) if resp.valid => {
                let refreshed = Session {
                    token: session.token,
                    user: resp.user,
                };
                if let Err(e) = self.store.save(&refreshed) {
                    warn!("Failed to persist refreshed session: {}", e);
                }
                *self.state.write().await = AuthState::Authenticated(refreshed);
                info!("Persisted session verified");
            }
            Ok(_) | Err(_) => {
                info!("Persisted session invalid, clearing");
                self.store.clear();
                *self.state.write().await = AuthState::Unauthenticated;
            }
        }
    }

    /// Validation failures return without touching the state machine; they
    /// model a submit button that was never enabled.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        validate_login(email, password)?;
        *self.state.write().await = AuthState::Authenticating;
        match self.gateway.login(email, password).await {
            Ok(resp) => {
                let session = Session {
                    token: resp.token,
                    user: resp.user,
                };
                if let Err(e) = self.store.save(&session) {
                    warn!("Failed to persist session: {}", e);
                }
                *self.state.write().await = AuthState::Authenticated(session);
                info!("Login succeeded");
                Ok(())
            }
            Err(e) => {
                *self.state.write().await = AuthState::AuthError(e.user_message());
                Ok(())
            }
        }
    }

    pub async fn register(
        &self,
        nick: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
        terms_accepted: bool,
    ) -> Result<(), ClientError> {
        validate_registration(nick, email, password, confirm_password, terms_accepted)?;
        *self.state.write().await = AuthState::Authenticating;
        match self
            .gateway
            .register(nick, email, password, terms_accepted)
            .await
        {
            Ok(resp) => {
                let session = Session {
                    token: resp.token,
                    user: resp.user,
                };
                if let Err(e) = self.store.save(&session) {
                    warn!("Failed to persist session: {}", e);
                }
                *self.state.write().await = AuthState::Authenticated(session);
                info!("Registration succeeded");
                Ok(())
            }
            Err(e) => {
                *self.state.write().await = AuthState::AuthError(e.user_message());
                Ok(())
            }
        }
    }

    /// Best-effort remote invalidation followed by unconditional local
    /// clear.  The user-visible contract is "logged out on this device"
    /// regardless of server acknowledgment.
    pub async fn logout(&self) {
        if let Some(token) = self.token().await {
            if let Err(e) = self.gateway.logout(&token).await {
                debug!("Remote logout failed (ignored): {}", e);
            }
        }
        self.store.clear();
        *self.state.write().await = AuthState::Unauthenticated;
        info!("Logged out");
    }

    pub async fn clear_error(&self) {
        let mut state = self.state.write().await;
        if matches!(*state, AuthState::AuthError(_)) {
            *state = AuthState::Unauthenticated;
        }
    }

    pub async fn set_instagram(
        &self,
        instagram_username: Option<String>,
    ) -> Result<(), ClientError> {
        let token = self.token().await.ok_or(ClientError::NotAuthenticated)?;
        let resp = self.gateway.update_instagram(&token, instagram_username).await?;
        self.patch_user(|user| {
            user.instagram_username = resp.instagram_username.clone();
            user.instagram_url = resp.instagram_url.clone();
        })
        .await;
        Ok(())
    }

    pub async fn upload_avatar(&self, path: &Path) -> Result<(), ClientError> {
        let token = self.token().await.ok_or(ClientError::NotAuthenticated)?;
        let resp = self.gateway.upload_avatar(&token, path).await?;
        self.patch_user(|user| user.avatar_url = resp.avatar_url.clone()).await;
        Ok(())
    }

    pub async fn delete_avatar(&self) -> Result<(), ClientError> {
        let token = self.token().await.ok_or(ClientError::NotAuthenticated)?;
        self.gateway.delete_avatar(&token).await?;
        self.patch_user(|user| user.avatar_url = None).await;
        Ok(())
    }

    /// Apply a profile mutation to the held user and re-persist the session.
    async fn patch_user(&self, patch: impl Fn(&mut User)) {
        let mut state = self.state.write().await;
        if let AuthState::Authenticated(session) = &*state {
            let mut session = session.clone();
            patch(&mut session.user);
            if let Err(e) = self.store.save(&session) {
                warn!("Failed to persist updated session: {}", e);
            }
            *state = AuthState::Authenticated(session);
        }
    }
}

// ── field-level validation ────────────────────────────────────────────────────

pub fn validate_email(email: &str) -> Result<(), ClientError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ClientError::Validation("Invalid email format".to_string()))
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ClientError> {
    validate_email(email)?;
    if password.chars().count() < 6 {
        return Err(ClientError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_registration(
    nick: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
    terms_accepted: bool,
) -> Result<(), ClientError> {
    let nick_len = nick.chars().count();
    if !(3..=50).contains(&nick_len) {
        return Err(ClientError::Validation(
            "Nick must be 3-50 characters".to_string(),
        ));
    }
    validate_login(email, password)?;
    if confirm_password.is_empty() || confirm_password != password {
        return Err(ClientError::Validation(
            "Passwords do not match".to_string(),
        ));
    }
    if !terms_accepted {
        return Err(ClientError::Validation(
            "Terms must be accepted".to_string(),
        ));
    }
    Ok(())
}

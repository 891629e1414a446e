//! Periodic refresh of the nearby-listeners list.
//!
//! Each successful load replaces the held list wholesale — there is no
//! merging or diffing.  The auto-refresh loop has an explicit stop signal
//! and keeps polling even when the list is empty; stalling on an empty list
//! would make an empty area permanently stale.

use crate::error::ClientError;
use crate::gateway::Gateway;
use crate::session::SessionMachine;
use chrono::{DateTime, Utc};
use hearnear_proto::api::NearbyListener;
use hearnear_proto::config::PollerConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct NearbyState {
    pub listeners: Vec<NearbyListener>,
    pub error: Option<String>,
    pub last_refresh: Option<DateTime<Utc>>,
}

pub struct NearbyPoller {
    state: Arc<RwLock<NearbyState>>,
    gateway: Gateway,
    session: Arc<SessionMachine>,
    config: PollerConfig,
    stop_tx: watch::Sender<bool>,
    running: AtomicBool,
}

impl NearbyPoller {
    pub fn new(gateway: Gateway, session: Arc<SessionMachine>, config: PollerConfig) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            state: Arc::new(RwLock::new(NearbyState::default())),
            gateway,
            session,
            config,
            stop_tx,
            running: AtomicBool::new(false),
        }
    }

    pub async fn snapshot(&self) -> NearbyState {
        self.state.read().await.clone()
    }

    /// Single fetch.  A missing token records a local error without any
    /// network call; a failed fetch records the message and leaves the
    /// previously held list in place.
    pub async fn load(&self, max_distance_km: f64, max_age_minutes: u32) {
        let Some(token) = self.session.token().await else {
            let mut state = self.state.write().await;
            state.error = Some(ClientError::NotAuthenticated.user_message());
            return;
        };
        match self
            .gateway
            .nearby_listeners(&token, max_distance_km, max_age_minutes)
            .await
        {
            Ok(resp) => {
                debug!("Loaded {} nearby listeners", resp.listeners.len());
                let mut state = self.state.write().await;
                state.listeners = resp.listeners;
                state.error = None;
                state.last_refresh = Some(Utc::now());
            }
            Err(e) => {
                warn!("Nearby listeners load failed: {}", e);
                let mut state = self.state.write().await;
                state.error = Some(e.user_message());
            }
        }
    }

    pub async fn load_defaults(&self) {
        self.load(self.config.max_distance_km, self.config.max_age_minutes)
            .await;
    }

    /// Spawn the periodic refresh loop.  Idempotent: a second call while the
    /// loop is alive does nothing.  The loop re-polls on every tick, even
    /// when the held list is empty, until `stop()` is signalled.
    pub fn start_auto_refresh(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.stop_tx.send(false);
        let poller = Arc::clone(self);
        let mut stop_rx = self.stop_tx.subscribe();
        tokio::spawn(async move {
            let period = Duration::from_secs(poller.config.interval_secs);
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; skip it so the loop waits a
            // full period after start_auto_refresh.
            ticker.tick().await;
            info!("Nearby auto-refresh started ({}s period)", period.as_secs());
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        poller.load_defaults().await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            poller.running.store(false, Ordering::SeqCst);
            info!("Nearby auto-refresh stopped");
        });
    }

    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

//! Throttled forwarder pairing captured music samples with a fresh location
//! fix and pushing them to the backend.
//!
//! The relay lives for the whole daemon process, independent of any UI
//! surface; only the sharing flag and explicit start/stop signals govern it.
//! Failure handling is fire-and-forget: a failed update is logged and
//! dropped, never retried, and never blocks later samples.

use crate::error::ClientError;
use crate::gateway::Gateway;
use crate::location::LocationProvider;
use crate::session::SessionMachine;
use hearnear_proto::api::{ActivityData, UpdateActivityRequest};
use hearnear_proto::protocol::MusicSample;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RelayStatus {
    #[default]
    Stopped,
    /// Start signal received, intake socket not yet bound.
    Starting,
    Running,
}

/// Minimum-interval gate over forwarded samples.  The gate arms when a
/// sample passes, independent of whether the downstream call succeeds, so a
/// failing backend cannot turn the relay into a tight retry loop.  Samples
/// arriving inside the window are dropped, not queued.
pub struct ThrottleGate {
    interval: Duration,
    last_forwarded: Option<Instant>,
}

impl ThrottleGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_forwarded: None,
        }
    }

    pub fn allow(&mut self, now: Instant) -> bool {
        let open = match self.last_forwarded {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        };
        if open {
            self.last_forwarded = Some(now);
        }
        open
    }
}

pub struct Relay {
    gateway: Gateway,
    location: LocationProvider,
    session: Arc<SessionMachine>,
    gate: ThrottleGate,
    status: RelayStatus,
    last_activity: Arc<RwLock<Option<ActivityData>>>,
}

impl Relay {
    pub fn new(
        gateway: Gateway,
        location: LocationProvider,
        session: Arc<SessionMachine>,
        throttle: Duration,
    ) -> Self {
        Self {
            gateway,
            location,
            session,
            gate: ThrottleGate::new(throttle),
            status: RelayStatus::Stopped,
            last_activity: Arc::new(RwLock::new(None)),
        }
    }

    pub fn status(&self) -> RelayStatus {
        self.status
    }

    /// Latest server-confirmed activity, held for display only.
    pub fn last_activity_handle(&self) -> Arc<RwLock<Option<ActivityData>>> {
        Arc::clone(&self.last_activity)
    }

    pub fn signal_start(&mut self) {
        if self.status == RelayStatus::Stopped {
            self.status = RelayStatus::Starting;
        }
    }

    /// Called once the intake socket is bound and listening.
    pub fn mark_running(&mut self) {
        self.status = RelayStatus::Running;
        info!("Relay running");
    }

    pub fn stop(&mut self) {
        self.status = RelayStatus::Stopped;
        info!("Relay stopped");
    }

    /// Process one qualifying sample.  Drops it when the relay is not
    /// running, when sharing is off, when no session token is present,
    /// inside the throttle window, or when no location fix is available;
    /// only the last case logs above debug, since it usually means a
    /// misconfigured location provider.
    pub async fn handle_sample(&mut self, sample: MusicSample, sharing_enabled: bool) {
        if self.status != RelayStatus::Running {
            debug!("Relay not running, dropping sample");
            return;
        }
        if !sharing_enabled {
            debug!("Sharing disabled, dropping sample");
            return;
        }
        let Some(token) = self.session.token().await else {
            debug!("No session token, dropping sample");
            return;
        };
        if !self.gate.allow(Instant::now()) {
            debug!("Throttled, dropping sample: {}", sample.track_name);
            return;
        }
        let Some(fix) = self.location.current_fix().await else {
            warn!(
                "{} — skipping relay cycle for: {}",
                ClientError::PermissionDenied,
                sample.track_name
            );
            return;
        };
        let request = UpdateActivityRequest {
            latitude: fix.latitude,
            longitude: fix.longitude,
            track_name: sample.track_name,
            artist_name: sample.artist_name,
            album_name: sample.album_name,
        };
        match self.gateway.update_activity(&token, &request).await {
            Ok(resp) => {
                debug!(
                    "Activity updated: {} – {}",
                    request.track_name, request.artist_name
                );
                *self.last_activity.write().await = Some(resp.activity);
            }
            Err(e) => {
                // Logged and dropped; the next sample gets a fresh attempt.
                warn!("Activity update failed: {}", e);
            }
        }
    }
}

//! Daemon event loop — all external inputs funnel through one channel.

use crate::capture;
use crate::poller::NearbyPoller;
use crate::relay::Relay;
use hearnear_proto::config::Config;
use hearnear_proto::prefs::{NowPlaying, Prefs, PrefsStore};
use hearnear_proto::protocol::CaptureEvent;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum DaemonEvent {
    /// A notification-style event arrived on the intake socket.
    Capture(CaptureEvent),
    /// The user toggled the sharing preference.
    SetSharing(bool),
    Shutdown,
}

pub struct DaemonCore {
    config: Config,
    relay: Relay,
    poller: Arc<NearbyPoller>,
    prefs: Arc<RwLock<Prefs>>,
    prefs_store: PrefsStore,
}

impl DaemonCore {
    pub fn new(
        config: Config,
        relay: Relay,
        poller: Arc<NearbyPoller>,
        prefs_store: PrefsStore,
    ) -> Self {
        let prefs = Arc::new(RwLock::new(prefs_store.load()));
        Self {
            config,
            relay,
            poller,
            prefs,
            prefs_store,
        }
    }

    /// Shared view of the preferences for the control API.  Writes go
    /// through the event loop only.
    pub fn prefs_handle(&self) -> Arc<RwLock<Prefs>> {
        Arc::clone(&self.prefs)
    }

    pub fn relay_mut(&mut self) -> &mut Relay {
        &mut self.relay
    }

    pub async fn run(mut self, mut event_rx: mpsc::Receiver<DaemonEvent>) -> anyhow::Result<()> {
        while let Some(event) = event_rx.recv().await {
            match event {
                DaemonEvent::Capture(event) => self.handle_capture(event).await,
                DaemonEvent::SetSharing(enabled) => self.set_sharing(enabled).await,
                DaemonEvent::Shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }
        self.poller.stop();
        self.relay.stop();
        Ok(())
    }

    /// Capture contract: events from non-allowlisted sources produce no
    /// sample and leave persisted now-playing state untouched.  A post with
    /// both fields non-blank updates now-playing and feeds the relay; a
    /// remove clears now-playing ("playback stopped").
    async fn handle_capture(&mut self, event: CaptureEvent) {
        if !capture::is_music_source(&self.config.capture.allowlist, event.source()) {
            debug!("Ignoring event from non-music source: {}", event.source());
            return;
        }
        match &event {
            CaptureEvent::Posted { .. } => {
                let Some(sample) = capture::extract(&event) else {
                    debug!("Dropping post with blank fields");
                    return;
                };
                debug!(
                    "Now playing: {} – {}",
                    sample.track_name, sample.artist_name
                );
                let sharing = {
                    let mut prefs = self.prefs.write().await;
                    prefs.now_playing = Some(NowPlaying {
                        track: sample.track_name.clone(),
                        artist: sample.artist_name.clone(),
                        album: sample.album_name.clone(),
                    });
                    self.persist(&prefs);
                    prefs.sharing_enabled
                };
                self.relay.handle_sample(sample, sharing).await;
            }
            CaptureEvent::Removed { .. } => {
                debug!("Music notification removed, clearing now-playing");
                let mut prefs = self.prefs.write().await;
                prefs.now_playing = None;
                self.persist(&prefs);
            }
        }
    }

    async fn set_sharing(&mut self, enabled: bool) {
        info!("Sharing {}", if enabled { "enabled" } else { "disabled" });
        let mut prefs = self.prefs.write().await;
        prefs.sharing_enabled = enabled;
        self.persist(&prefs);
    }

    fn persist(&self, prefs: &Prefs) {
        if let Err(e) = self.prefs_store.save(prefs) {
            warn!("Failed to persist prefs: {}", e);
        }
    }
}

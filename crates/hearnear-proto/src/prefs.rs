//! Persisted preferences: the sharing flag and the last-seen now-playing
//! strings.  Written only from the daemon's event loop, so writes to the
//! file are naturally serialized.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub track: String,
    pub artist: String,
    pub album: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Prefs {
    /// Gates whether the relay is allowed to transmit.  Toggled only by
    /// explicit user action.
    #[serde(default)]
    pub sharing_enabled: bool,
    #[serde(default)]
    pub now_playing: Option<NowPlaying>,
}

pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Self {
        Self::new(crate::platform::data_dir().join("prefs.json"))
    }

    /// A missing or unreadable file yields defaults (sharing off, nothing
    /// playing).
    pub fn load(&self) -> Prefs {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Prefs::default();
        };
        match serde_json::from_str(&content) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Discarding unreadable prefs file: {}", e);
                Prefs::default()
            }
        }
    }

    pub fn save(&self, prefs: &Prefs) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(prefs)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

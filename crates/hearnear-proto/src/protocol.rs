use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current intake protocol version.  Bump this when the wire format changes
/// in a breaking way.  Notifiers send it in their first frame and the daemon
/// refuses incompatible peers.
pub const PROTOCOL_VERSION: u32 = 1;

/// Events sent from a notifier process to the daemon's intake socket.
///
/// A notifier is any small bridge that watches a player for notification-like
/// events: post when metadata appears or changes, remove when playback stops
/// and the notification goes away.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum CaptureEvent {
    /// A now-playing notification was posted or updated.
    /// `title` carries the track, `text` carries the artist.
    Posted {
        source: String,
        title: String,
        text: String,
        #[serde(default)]
        album: Option<String>,
    },
    /// The now-playing notification disappeared — playback likely stopped.
    Removed { source: String },
}

impl CaptureEvent {
    pub fn source(&self) -> &str {
        match self {
            CaptureEvent::Posted { source, .. } => source,
            CaptureEvent::Removed { source } => source,
        }
    }
}

/// A track/artist pair extracted from a qualifying capture event.
/// Ephemeral: produced by capture, consumed once by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSample {
    pub track_name: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// Frames sent over the intake socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "frame")]
pub enum Frame {
    /// First frame from a notifier: protocol handshake.
    Hello { protocol_version: u32 },
    Capture { data: CaptureEvent },
}

/// Upper bound on a single frame's payload.  A length header beyond this is
/// treated as a corrupt stream rather than something to buffer for.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

impl Frame {
    /// Encode as a u32 big-endian length header followed by JSON.
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        let len = json.len() as u32;
        let mut result = Vec::with_capacity(4 + json.len());
        result.extend_from_slice(&len.to_be_bytes());
        result.extend_from_slice(&json);
        Ok(result)
    }

    /// Decode one frame from the front of `data`.  `Ok(None)` means the
    /// buffer does not yet hold a complete frame; a complete frame that
    /// fails to parse is an error, so callers can tell "wait for more bytes"
    /// apart from a corrupt stream.
    pub fn decode(data: &[u8]) -> anyhow::Result<Option<(Self, usize)>> {
        if data.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if len > MAX_FRAME_LEN {
            anyhow::bail!("Frame length {} exceeds limit", len);
        }
        if data.len() < 4 + len {
            return Ok(None);
        }
        let frame: Self = serde_json::from_slice(&data[4..4 + len])?;
        Ok(Some((frame, 4 + len)))
    }
}

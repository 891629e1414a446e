//! Classification and extraction of now-playing metadata from capture
//! events.
//!
//! `is_music_source` is an exact match over the closed allowlist from
//! config.  `extract` turns a `Posted` event into a `MusicSample` — title is
//! the track, text is the artist — and yields `None` when either field is
//! blank.  Events from non-allowlisted sources never produce a sample and
//! never touch persisted now-playing state (the caller checks the allowlist
//! first).

use chrono::Utc;
use hearnear_proto::protocol::{CaptureEvent, MusicSample};

pub fn is_music_source(allowlist: &[String], source: &str) -> bool {
    allowlist.iter().any(|s| s == source)
}

pub fn extract(event: &CaptureEvent) -> Option<MusicSample> {
    let CaptureEvent::Posted {
        title, text, album, ..
    } = event
    else {
        return None;
    };
    let track = title.trim();
    let artist = text.trim();
    if track.is_empty() || artist.is_empty() {
        return None;
    }
    Some(MusicSample {
        track_name: track.to_string(),
        artist_name: artist.to_string(),
        album_name: album.clone().filter(|a| !a.trim().is_empty()),
        captured_at: Utc::now(),
    })
}

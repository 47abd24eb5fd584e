use serde::Serialize;
use std::path::PathBuf;

use super::identity;
use super::metadata::{Artwork, TrackMetadata};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// One loadable audio item.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: Option<u32>,
    pub genre: Option<String>,
    pub duration_secs: Option<f64>,
    pub duration_display: String,
    pub artwork: Option<Artwork>,
    /// Raw lyric text as last loaded or uploaded for this track.
    pub lyrics: Option<String>,
    /// Storage key derived from artist/title/album. Stable for the life of
    /// the track.
    pub identity: String,
}

impl Track {
    /// Build a track from extracted metadata, filling placeholders for
    /// missing tags before the identity is derived.
    pub fn new(path: PathBuf, meta: TrackMetadata) -> Self {
        let title = meta.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let artist = meta.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let album = meta.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
        let identity = identity::derive(&artist, &title, &album);
        let duration_display = meta.duration_secs.map(format_duration).unwrap_or_default();

        Self {
            path,
            title,
            artist,
            album,
            year: meta.year,
            genre: meta.genre,
            duration_secs: meta.duration_secs,
            duration_display,
            artwork: meta.artwork,
            lyrics: None,
            identity,
        }
    }
}

/// Format a duration in seconds as `m:ss`.
pub fn format_duration(secs: f64) -> String {
    let total = secs.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

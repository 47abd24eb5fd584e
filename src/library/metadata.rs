use anyhow::Context;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::{Accessor, ItemKey};
use serde::Serialize;
use std::path::Path;

/// Raw tag fields read from an audio file, before placeholder fill-in.
#[derive(Debug, Clone, Default)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<u32>,
    pub genre: Option<String>,
    pub duration_secs: Option<f64>,
    pub artwork: Option<Artwork>,
}

/// Reference to embedded cover art. The raw bytes are not retained.
#[derive(Debug, Clone, Serialize)]
pub struct Artwork {
    pub mime: Option<String>,
    pub bytes: usize,
}

/// Read tag metadata and audio properties from a file.
///
/// This is the only place the crate touches audio binary formats; everything
/// past this boundary works with plain strings and numbers.
pub fn extract(path: &Path) -> anyhow::Result<TrackMetadata> {
    let tagged = lofty::read_from_path(path)
        .with_context(|| format!("read tags from {}", path.display()))?;

    let mut meta = TrackMetadata {
        duration_secs: known_duration(tagged.properties().duration()),
        ..TrackMetadata::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        meta.title = non_empty(tag.get_string(&ItemKey::TrackTitle));
        meta.artist = non_empty(tag.get_string(&ItemKey::TrackArtist));
        meta.album = non_empty(tag.get_string(&ItemKey::AlbumTitle));
        meta.genre = non_empty(tag.genre().as_deref());
        meta.year = tag.year();
        meta.artwork = tag.pictures().first().map(|pic| Artwork {
            mime: pic.mime_type().map(|m| m.as_str().to_string()),
            bytes: pic.data().len(),
        });
    }

    Ok(meta)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

// Some formats parse without a usable length; lofty reports those as zero.
// Treat that as unknown so the player clock can fill it in later.
fn known_duration(duration: std::time::Duration) -> Option<f64> {
    (!duration.is_zero()).then(|| duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn extract_fails_on_non_audio_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not-audio.mp3");
        fs::write(&path, b"plain text, no frames").unwrap();
        assert!(extract(&path).is_err());
    }

    #[test]
    fn non_empty_trims_and_drops_blank() {
        assert_eq!(non_empty(Some("  Hello ")), Some("Hello".to_string()));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn zero_duration_reads_as_unknown() {
        use std::time::Duration;
        assert_eq!(known_duration(Duration::ZERO), None);
        assert_eq!(known_duration(Duration::from_secs(185)), Some(185.0));
    }
}

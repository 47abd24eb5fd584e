//! Stable track identity derivation.
//!
//! Stored lyrics are keyed by a normalized digest of (artist, title, album)
//! rather than by file path, so re-importing the same song from a different
//! location resolves to the same record.

/// Derive the storage key for a track from its tag metadata.
///
/// Each field is trimmed, lowercased, and stripped of internal whitespace,
/// the three are joined as `artist-title-album`, and every character outside
/// ASCII letters and digits is dropped. Pure and deterministic; the file
/// path never participates. Distinct inputs can fold to the same key when
/// they differ only in whitespace or punctuation.
pub fn derive(artist: &str, title: &str, album: &str) -> String {
    let joined = format!(
        "{}-{}-{}",
        normalize(artist),
        normalize(title),
        normalize(album)
    );
    joined.chars().filter(char::is_ascii_alphanumeric).collect()
}

fn normalize(field: &str) -> String {
    field
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

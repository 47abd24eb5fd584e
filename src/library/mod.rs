//! Local audio ingestion: tag extraction, identity assignment, de-dup.

pub mod identity;
pub mod metadata;
pub mod model;

pub use model::Track;

use std::path::PathBuf;

/// Build tracks from the given audio files, in input order.
///
/// A file that fails metadata parsing is skipped with a warning; a file
/// whose derived identity is already present is skipped as a duplicate.
/// Neither aborts the rest of the batch.
pub fn ingest(paths: &[PathBuf]) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    for path in paths {
        let meta = match metadata::extract(path) {
            Ok(meta) => meta,
            Err(err) => {
                tracing::warn!("skipping {}: {err:#}", path.display());
                continue;
            }
        };

        let track = Track::new(path.clone(), meta);
        if tracks.iter().any(|t| t.identity == track.identity) {
            tracing::debug!("skipping duplicate {} ({})", path.display(), track.identity);
            continue;
        }
        tracks.push(track);
    }

    tracks
}

//! Synchronized lyrics engine.
//!
//! This module provides:
//! - a parser for `.lrc`-style timestamped lyric text
//! - an active-cue tracker driven by the playback clock

pub mod parser;
pub mod tracker;

pub use parser::{Cue, INSTRUMENTAL_TEXT, parse};
pub use tracker::active_index;

/// Whether any cue in the sequence carries a timestamp.
///
/// Plain-text lyrics parse to untimed cues only; those are rendered in
/// full rather than streamed line by line.
pub fn is_synced(cues: &[Cue]) -> bool {
    cues.iter().any(|c| c.time().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_synced() {
        assert!(is_synced(&parse("[00:01.00]Hi")));
        assert!(!is_synced(&parse("just some text\nanother line")));
        assert!(!is_synced(&[]));
    }
}

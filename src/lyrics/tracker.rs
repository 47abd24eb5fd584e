//! Active-cue lookup against the playback clock.

use super::parser::Cue;

/// Index of the cue that should be active at `time` seconds, or `None`
/// when nothing is: before the first selectable cue, at or past the end
/// marker, or when the sequence has no timed cues at all.
///
/// Stateless; every call recomputes from the full sequence, so seeks in
/// either direction need no special handling. Assumes timed cues appear in
/// non-decreasing order.
pub fn active_index(cues: &[Cue], time: f64) -> Option<usize> {
    let ended = cues
        .iter()
        .find_map(|c| match c {
            Cue::End { time: end } => Some(*end),
            _ => None,
        })
        .is_some_and(|end| time >= end);
    if ended {
        return None;
    }

    (0..cues.len()).find(|&i| {
        let cue = &cues[i];
        let start = match cue.time() {
            Some(start) if cue.selectable() => start,
            _ => return false,
        };
        if start > time {
            return false;
        }
        match cues.get(i + 1) {
            None => true,
            // A following cue without a time closes the window.
            Some(next) => next.time().is_some_and(|t| t > time),
        }
    })
}

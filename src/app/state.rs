use crate::library::{Track, model};
use crate::lyrics::{self, Cue};

/// What playback should do after a track finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Load and play the track at this index.
    Next(usize),
    /// Last track finished; shut down.
    Done,
}

/// All mutable application state. Only the event-loop task touches it;
/// spawned work reports back through the event channel.
pub struct AppState {
    pub should_quit: bool,

    pub tracks: Vec<Track>,
    pub current: Option<usize>,

    // Playback clock
    pub playing: bool,
    pub position_secs: f64,
    pub duration_secs: f64,

    // Lyrics for the current track
    pub cues: Vec<Cue>,
    pub active_cue: Option<usize>,
    /// Identity the cue list (or the in-flight store read) belongs to.
    pub lyrics_identity: Option<String>,
    pub lyrics_loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            tracks: Vec::new(),
            current: None,
            playing: false,
            position_secs: 0.0,
            duration_secs: 0.0,
            cues: Vec::new(),
            active_cue: None,
            lyrics_identity: None,
            lyrics_loading: false,
        }
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    pub fn current_track_mut(&mut self) -> Option<&mut Track> {
        self.current.and_then(|i| self.tracks.get_mut(i))
    }

    /// Make the track at `index` current, resetting the clock and any lyric
    /// state left over from the previous track.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.tracks.len() {
            return false;
        }
        self.current = Some(index);
        self.position_secs = 0.0;
        self.duration_secs = 0.0;
        self.cues.clear();
        self.active_cue = None;
        self.lyrics_identity = None;
        self.lyrics_loading = false;
        true
    }

    /// Decide what follows the track that just ended. After the last track
    /// the player shuts down instead of wrapping around.
    pub fn advance_after_end(&mut self) -> Advance {
        self.position_secs = 0.0;
        self.duration_secs = 0.0;
        match self.current {
            Some(i) if i + 1 < self.tracks.len() => Advance::Next(i + 1),
            _ => {
                self.playing = false;
                self.should_quit = true;
                Advance::Done
            }
        }
    }

    /// Record a clock tick and recompute the active cue. `lead` seconds are
    /// added to the clock so lines activate slightly ahead of the voice.
    pub fn apply_position(&mut self, seconds: f64, lead: f64) {
        self.position_secs = seconds;
        self.active_cue = lyrics::active_index(&self.cues, seconds + lead);
    }

    /// Record the engine-reported duration, filling in a track length the
    /// file's tags did not provide.
    pub fn apply_duration(&mut self, seconds: f64) {
        self.duration_secs = seconds;
        if let Some(track) = self.current_track_mut()
            && track.duration_secs.is_none()
            && seconds > 0.0
        {
            track.duration_secs = Some(seconds);
            track.duration_display = model::format_duration(seconds);
        }
    }

    /// Note that a store read for `identity` is in flight; clears whatever
    /// cues were showing.
    pub fn begin_lyrics_load(&mut self, identity: String) {
        self.cues.clear();
        self.active_cue = None;
        self.lyrics_identity = Some(identity);
        self.lyrics_loading = true;
    }

    /// Install lyrics delivered for `identity`, unless the selection has
    /// moved on (or an upload already satisfied the load) since the read
    /// was spawned. Returns whether the cues were installed.
    pub fn install_lyrics(&mut self, identity: &str, raw: &str) -> bool {
        if self.lyrics_identity.as_deref() != Some(identity) || !self.lyrics_loading {
            return false;
        }
        self.set_lyrics(identity.to_string(), raw);
        true
    }

    /// Unconditionally replace the current lyrics, as after an upload.
    pub fn set_lyrics(&mut self, identity: String, raw: &str) {
        self.cues = lyrics::parse(raw);
        self.active_cue = None;
        self.lyrics_identity = Some(identity);
        self.lyrics_loading = false;
        if let Some(track) = self.current_track_mut() {
            track.lyrics = Some(raw.to_string());
        }
    }

    /// Settle a store read that found nothing, unless it is stale.
    pub fn mark_lyrics_missing(&mut self, identity: &str) -> bool {
        if self.lyrics_identity.as_deref() != Some(identity) || !self.lyrics_loading {
            return false;
        }
        self.cues.clear();
        self.active_cue = None;
        self.lyrics_loading = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::identity;
    use std::path::PathBuf;

    fn make_track(title: &str) -> Track {
        Track {
            path: PathBuf::from(format!("/music/{title}.mp3")),
            title: title.to_string(),
            artist: "Artist".into(),
            album: "Album".into(),
            year: None,
            genre: None,
            duration_secs: Some(60.0),
            duration_display: "1:00".into(),
            artwork: None,
            lyrics: None,
            identity: identity::derive("Artist", title, "Album"),
        }
    }

    fn state_with_tracks(titles: &[&str]) -> AppState {
        let mut state = AppState::new();
        state.tracks = titles.iter().map(|t| make_track(t)).collect();
        state
    }

    #[test]
    fn select_resets_clock_and_lyrics() {
        let mut state = state_with_tracks(&["a", "b"]);
        assert!(state.select(0));
        state.set_lyrics(state.tracks[0].identity.clone(), "[00:01.00]Hi");
        state.position_secs = 30.0;

        assert!(state.select(1));
        assert_eq!(state.current, Some(1));
        assert_eq!(state.position_secs, 0.0);
        assert!(state.cues.is_empty());
        assert_eq!(state.active_cue, None);
        assert_eq!(state.lyrics_identity, None);

        assert!(!state.select(2));
    }

    #[test]
    fn advance_moves_to_next_track_mid_list() {
        let mut state = state_with_tracks(&["a", "b"]);
        state.select(0);
        state.playing = true;

        assert_eq!(state.advance_after_end(), Advance::Next(1));
        assert!(state.playing);
        assert!(!state.should_quit);
    }

    #[test]
    fn advance_after_last_track_shuts_down() {
        let mut state = state_with_tracks(&["a", "b"]);
        state.select(1);
        state.playing = true;

        assert_eq!(state.advance_after_end(), Advance::Done);
        assert!(!state.playing);
        assert!(state.should_quit);
    }

    #[test]
    fn position_ticks_drive_the_active_cue() {
        let mut state = state_with_tracks(&["a"]);
        state.select(0);
        let id = state.tracks[0].identity.clone();
        state.set_lyrics(id, "[00:10.00]Hello\n[00:15.00]\n");

        state.apply_position(5.0, 0.0);
        assert_eq!(state.active_cue, Some(0));
        state.apply_position(12.0, 0.0);
        assert_eq!(state.active_cue, Some(1));
        state.apply_position(20.0, 0.0);
        assert_eq!(state.active_cue, None);

        // The lead offset pulls activation earlier.
        state.apply_position(9.5, 0.6);
        assert_eq!(state.active_cue, Some(1));
    }

    #[test]
    fn engine_duration_fills_untagged_track_length() {
        let mut state = state_with_tracks(&["a"]);
        state.tracks[0].duration_secs = None;
        state.tracks[0].duration_display = String::new();
        state.select(0);

        state.apply_duration(185.0);
        assert_eq!(state.duration_secs, 185.0);
        assert_eq!(state.tracks[0].duration_secs, Some(185.0));
        assert_eq!(state.tracks[0].duration_display, "3:05");

        // A length read from the tags is left alone.
        let mut state = state_with_tracks(&["b"]);
        state.select(0);
        state.apply_duration(200.0);
        assert_eq!(state.tracks[0].duration_secs, Some(60.0));
        assert_eq!(state.tracks[0].duration_display, "1:00");
    }

    #[test]
    fn stale_store_reads_are_discarded() {
        let mut state = state_with_tracks(&["a", "b"]);
        state.select(0);
        let first = state.tracks[0].identity.clone();
        state.begin_lyrics_load(first.clone());

        // Selection moves on before the read completes.
        state.select(1);
        let second = state.tracks[1].identity.clone();
        state.begin_lyrics_load(second.clone());

        assert!(!state.install_lyrics(&first, "[00:01.00]Old"));
        assert!(state.cues.is_empty());

        assert!(state.install_lyrics(&second, "[00:01.00]New"));
        assert_eq!(state.cues.len(), 2);
        assert_eq!(state.tracks[1].lyrics.as_deref(), Some("[00:01.00]New"));
    }

    #[test]
    fn upload_wins_over_pending_load() {
        let mut state = state_with_tracks(&["a"]);
        state.select(0);
        let id = state.tracks[0].identity.clone();
        state.begin_lyrics_load(id.clone());

        // Upload lands while the read is still in flight.
        state.set_lyrics(id.clone(), "[00:02.00]Uploaded");
        let uploaded = state.cues.clone();

        // The read completing afterwards must not clobber the upload.
        assert!(!state.install_lyrics(&id, "[00:09.00]Stored"));
        assert_eq!(state.cues, uploaded);
    }

    #[test]
    fn missing_lyrics_settle_the_load() {
        let mut state = state_with_tracks(&["a"]);
        state.select(0);
        let id = state.tracks[0].identity.clone();
        state.begin_lyrics_load(id.clone());

        assert!(state.mark_lyrics_missing(&id));
        assert!(!state.lyrics_loading);
        assert!(state.cues.is_empty());

        assert!(!state.mark_lyrics_missing("someone-else"));
    }
}

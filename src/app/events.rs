#[derive(Debug, Clone)]
pub enum Event {
    Player(PlayerEvent),
    Store(StoreEvent),
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Started,
    Paused,
    Position { seconds: f64 },
    Duration { seconds: f64 },
    Ended,
    Error(String),
}

/// Completions of lyrics-store reads spawned off the event loop. Each
/// carries the identity it was requested for, so completions that arrive
/// after the selection moved on can be dropped.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    LyricsLoaded { identity: String, raw: String },
    LyricsNotFound { identity: String },
}

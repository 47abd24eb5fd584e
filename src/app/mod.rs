pub mod events;
pub mod state;

use crate::config::Config;
use crate::library::{self, model};
use crate::lyrics;
use crate::player::mpv::MpvHandle;
use crate::storage::LyricsStore;
use anyhow::Context;
use events::{Event, PlayerEvent, StoreEvent};
use state::{Advance, AppState};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

pub struct App {
    cfg: Config,
    state: AppState,
    store: StoreHandle,
    mpv: Option<MpvHandle>,
    /// Last cue index written to stdout, so a line prints once per
    /// activation rather than once per clock tick.
    last_printed: Option<usize>,
}

impl App {
    pub fn new(cfg: Config, files: Vec<PathBuf>) -> anyhow::Result<Self> {
        // Open once up front so schema problems surface before playback.
        let _ = LyricsStore::open(&cfg.lyrics_db_path())?;
        let store = StoreHandle {
            path: cfg.lyrics_db_path(),
        };

        let mut state = AppState::new();
        state.tracks = library::ingest(&files);
        if state.tracks.is_empty() {
            anyhow::bail!("no playable tracks");
        }
        tracing::info!("loaded {} track(s)", state.tracks.len());

        Ok(Self {
            cfg,
            state,
            store,
            mpv: None,
            last_printed: None,
        })
    }

    /// Play every track in order, streaming the active lyric line to
    /// stdout. `upload` attaches a lyric file to the first track before
    /// playback settles.
    pub async fn run(&mut self, upload: Option<PathBuf>) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);

        let mpv_log = self.cfg.paths.data_dir.join("mpv.log");
        let mpv = MpvHandle::spawn(
            tx.clone(),
            self.cfg.player.audio_device.as_deref(),
            Some(&mpv_log),
        )
        .await?;
        mpv.set_volume(self.cfg.player.volume).await?;
        self.mpv = Some(mpv);

        self.select_and_play(0, &tx).await?;

        if let Some(path) = upload {
            self.upload_lyrics(&path)?;
        }

        while let Some(ev) = rx.recv().await {
            match ev {
                Event::Player(pe) => self.handle_player(pe, &tx).await,
                Event::Store(se) => self.handle_store(se),
            }

            if self.state.should_quit {
                break;
            }
        }

        Ok(())
    }

    async fn handle_player(&mut self, pe: PlayerEvent, tx: &mpsc::Sender<Event>) {
        match pe {
            PlayerEvent::Started => self.state.playing = true,
            PlayerEvent::Paused => {
                // Pauses come from outside (another client on the mpv
                // socket); show where playback stopped.
                if self.state.playing {
                    println!(
                        "  [paused {} / {}]",
                        model::format_duration(self.state.position_secs),
                        model::format_duration(self.state.duration_secs),
                    );
                }
                self.state.playing = false;
            }
            PlayerEvent::Duration { seconds } => self.state.apply_duration(seconds),
            PlayerEvent::Position { seconds } => {
                self.state
                    .apply_position(seconds, self.cfg.lyrics.lead_seconds);
                self.print_active_cue();
            }
            PlayerEvent::Ended => match self.state.advance_after_end() {
                Advance::Next(index) => {
                    if let Err(e) = self.select_and_play(index, tx).await {
                        tracing::warn!("advance failed: {e:#}");
                        self.state.should_quit = true;
                    }
                }
                Advance::Done => {}
            },
            PlayerEvent::Error(e) => tracing::warn!("player: {e}"),
        }
    }

    fn handle_store(&mut self, se: StoreEvent) {
        match se {
            StoreEvent::LyricsLoaded { identity, raw } => {
                if self.state.install_lyrics(&identity, &raw) {
                    self.print_unsynced_lyrics();
                }
            }
            StoreEvent::LyricsNotFound { identity } => {
                if self.state.mark_lyrics_missing(&identity) {
                    println!("  No lyrics available");
                }
            }
        }
    }

    async fn select_and_play(
        &mut self,
        index: usize,
        tx: &mpsc::Sender<Event>,
    ) -> anyhow::Result<()> {
        if !self.state.select(index) {
            anyhow::bail!("track index {index} out of range");
        }
        self.last_printed = None;

        let (path, line) = {
            let track = self
                .state
                .current_track()
                .context("no current track after select")?;
            let line = if track.duration_display.is_empty() {
                format!("> {} - {}", track.title, track.artist)
            } else {
                format!(
                    "> {} - {} [{}]",
                    track.title, track.artist, track.duration_display
                )
            };
            (track.path.clone(), line)
        };
        println!("{line}");

        self.spawn_lyrics_load(tx.clone());

        if let Some(mpv) = &self.mpv {
            mpv.load_file(&path).await?;
        }
        Ok(())
    }

    /// Read stored lyrics for the current track off the loop; the result
    /// comes back as a `StoreEvent` carrying the identity it was for.
    fn spawn_lyrics_load(&mut self, tx: mpsc::Sender<Event>) {
        let Some(track) = self.state.current_track() else {
            return;
        };
        let identity = track.identity.clone();
        self.state.begin_lyrics_load(identity.clone());

        let store = self.store.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking({
                let id = identity.clone();
                move || store.get(&id)
            })
            .await;

            let event = match result {
                Ok(Ok(Some(raw))) => StoreEvent::LyricsLoaded { identity, raw },
                Ok(Ok(None)) => StoreEvent::LyricsNotFound { identity },
                Ok(Err(e)) => {
                    tracing::warn!("lyrics read failed: {e:#}");
                    StoreEvent::LyricsNotFound { identity }
                }
                Err(e) => {
                    tracing::warn!("lyrics read task failed: {e}");
                    StoreEvent::LyricsNotFound { identity }
                }
            };
            let _ = tx.send(Event::Store(event)).await;
        });
    }

    /// Attach a lyric file to the current track: shown immediately, then
    /// written through to the store under the track's identity.
    fn upload_lyrics(&mut self, path: &Path) -> anyhow::Result<()> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let identity = match self.state.current_track() {
            Some(track) => track.identity.clone(),
            None => return Ok(()),
        };

        self.state.set_lyrics(identity.clone(), &raw);
        self.print_unsynced_lyrics();

        let store = self.store.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || store.upsert(&identity, &raw)).await;
            match result {
                Ok(Ok(existed)) => {
                    tracing::debug!("lyrics saved (replaced existing: {existed})");
                }
                Ok(Err(e)) => tracing::warn!("lyrics save failed: {e:#}"),
                Err(e) => tracing::warn!("lyrics save task failed: {e}"),
            }
        });
        Ok(())
    }

    /// Timed cues stream as they activate; a sequence with no timed cues
    /// is plain text and prints in full once.
    fn print_unsynced_lyrics(&self) {
        if self.state.cues.is_empty() || lyrics::is_synced(&self.state.cues) {
            return;
        }
        for cue in &self.state.cues {
            if let Some(text) = cue.display_text() {
                println!("  {text}");
            }
        }
    }

    fn print_active_cue(&mut self) {
        if self.state.active_cue == self.last_printed {
            return;
        }
        self.last_printed = self.state.active_cue;
        if let Some(i) = self.state.active_cue
            && let Some(text) = self.state.cues.get(i).and_then(|c| c.display_text())
        {
            println!("  {text}");
        }
    }
}

// rusqlite from async tasks: open a connection per operation.
#[derive(Clone)]
struct StoreHandle {
    path: PathBuf,
}

impl StoreHandle {
    fn open(&self) -> anyhow::Result<LyricsStore> {
        LyricsStore::open(&self.path)
    }

    fn get(&self, song_id: &str) -> anyhow::Result<Option<String>> {
        self.open()?.get(song_id)
    }

    fn upsert(&self, song_id: &str, lyrics: &str) -> anyhow::Result<bool> {
        self.open()?.upsert(song_id, lyrics)
    }
}

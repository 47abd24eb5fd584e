mod app;
mod config;
mod library;
mod lyrics;
mod player;
mod storage;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "refrain", version, about = "Local music player with synced lyrics")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play audio files in order, streaming the active lyric line to stdout.
    Play {
        /// Audio files to play.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Attach this lyric file to the first track before playback.
        #[arg(long)]
        lrc: Option<PathBuf>,
    },
    /// Read audio files and print their metadata and identity keys (headless).
    Tracks {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Dump as JSON instead of a listing.
        #[arg(long)]
        json: bool,
    },
    /// Parse a lyric file and print its cues (headless).
    Cues { file: PathBuf },
    /// Manage stored lyrics.
    Lyrics {
        #[command(subcommand)]
        cmd: LyricsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum LyricsCommand {
    /// Store lyrics for a track identity.
    Save { id: String, file: PathBuf },
    /// Print stored lyrics for a track identity.
    Get { id: String },
    /// Replace stored lyrics, reporting whether a record existed.
    Edit { id: String, file: PathBuf },
    /// Delete stored lyrics, reporting whether a record existed.
    Delete { id: String },
    /// List every stored record.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Command::Play { files, lrc } => {
            let mut app = app::App::new(cfg, files)?;
            app.run(lrc).await?;
        }
        Command::Tracks { files, json } => {
            let tracks = library::ingest(&files);
            if json {
                println!("{}", serde_json::to_string_pretty(&tracks)?);
            } else {
                print_tracks(&tracks);
            }
        }
        Command::Cues { file } => {
            let raw = read_lyric_file(&file)?;
            print_cues(&lyrics::parse(&raw));
        }
        Command::Lyrics { cmd } => {
            let store = storage::LyricsStore::open(&cfg.lyrics_db_path())?;
            match cmd {
                LyricsCommand::Save { id, file } => {
                    let raw = read_lyric_file(&file)?;
                    store.upsert(&id, &raw)?;
                    println!("Saved lyrics for {id}.");
                }
                LyricsCommand::Get { id } => match store.get(&id)? {
                    Some(text) => println!("{text}"),
                    None => println!("No lyrics stored for {id}."),
                },
                LyricsCommand::Edit { id, file } => {
                    let raw = read_lyric_file(&file)?;
                    if store.upsert(&id, &raw)? {
                        println!("Updated lyrics for {id}.");
                    } else {
                        println!("No existing record; created one for {id}.");
                    }
                }
                LyricsCommand::Delete { id } => {
                    if store.delete(&id)? {
                        println!("Deleted lyrics for {id}.");
                    } else {
                        println!("No lyrics stored for {id}.");
                    }
                }
                LyricsCommand::List => {
                    for (id, text) in store.all()? {
                        println!("{id}  ({} line(s))", text.lines().count());
                    }
                }
            }
        }
    }

    Ok(())
}

fn read_lyric_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn print_tracks(tracks: &[library::Track]) {
    for (i, t) in tracks.iter().enumerate() {
        println!("{:02}. {} - {}  (id={})", i + 1, t.title, t.artist, t.identity);

        let mut details = vec![format!("album: {}", t.album)];
        if let Some(year) = t.year {
            details.push(format!("year: {year}"));
        }
        if let Some(genre) = &t.genre {
            details.push(format!("genre: {genre}"));
        }
        if !t.duration_display.is_empty() {
            details.push(format!("length: {}", t.duration_display));
        }
        if let Some(art) = &t.artwork {
            details.push(match &art.mime {
                Some(mime) => format!("artwork: {mime}"),
                None => "artwork: yes".to_string(),
            });
        }
        println!("    {}", details.join(", "));
    }
}

fn print_cues(cues: &[lyrics::Cue]) {
    for cue in cues {
        match cue {
            lyrics::Cue::Line { time, text } => println!("{time:>8.2}  {text}"),
            lyrics::Cue::Instrumental { time } => {
                println!("{time:>8.2}  {}", lyrics::INSTRUMENTAL_TEXT)
            }
            lyrics::Cue::Inactive { text } => println!("          {text}"),
            lyrics::Cue::End { time } => println!("{time:>8.2}  <end>"),
        }
    }
}

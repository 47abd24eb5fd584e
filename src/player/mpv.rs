use crate::app::events::{Event, PlayerEvent};
use anyhow::Context;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    process::{Child, Command},
    sync::mpsc,
};

/// Handle to an mpv subprocess driven over its JSON IPC socket. mpv does
/// the decoding and playback; we only feed it files and consume its clock.
#[derive(Debug)]
pub struct MpvHandle {
    child: Child,
    socket_path: PathBuf,
    writer: tokio::sync::Mutex<tokio::io::WriteHalf<UnixStream>>,
    request_id: AtomicU64,
}

impl MpvHandle {
    pub async fn spawn(
        event_tx: mpsc::Sender<Event>,
        audio_device: Option<&str>,
        log_file: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let socket_path = std::env::temp_dir().join("refrain-mpv.sock");
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new("mpv");
        cmd.args([
            "--no-video",
            "--idle=yes",
            "--input-terminal=no",
            // keep the terminal quiet; failures come back over IPC
            "--really-quiet",
        ]);
        if let Some(dev) = audio_device {
            cmd.arg(format!("--audio-device={dev}"));
        }
        if let Some(p) = log_file {
            cmd.arg(format!("--log-file={}", p.display()));
        }
        let child = cmd
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("spawn mpv")?;

        // Connect (mpv creates the socket shortly after starting).
        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        // Pump mpv JSON events -> app events.
        tokio::spawn(read_events_loop(reader, event_tx.clone()));

        let this = Self {
            child,
            socket_path,
            writer: tokio::sync::Mutex::new(writer),
            request_id: AtomicU64::new(1),
        };

        // Surface load failures as events.
        this.command(json!({"command":["request_log_messages", "warn"]}))
            .await?;

        // Observe the clock properties. Track end is taken from end-file
        // alone so it fires exactly once per file.
        this.command(json!({"command":["observe_property", 1, "time-pos"]}))
            .await?;
        this.command(json!({"command":["observe_property", 2, "duration"]}))
            .await?;
        this.command(json!({"command":["observe_property", 3, "pause"]}))
            .await?;

        Ok(this)
    }

    pub async fn load_file(&self, path: &Path) -> anyhow::Result<()> {
        let target = path.to_string_lossy();
        self.command(json!({"command":["loadfile", target.as_ref(), "replace"]}))
            .await
    }

    pub async fn set_volume(&self, volume_0_100: u8) -> anyhow::Result<()> {
        self.command(json!({"command":["set_property", "volume", volume_0_100]}))
            .await
    }

    async fn command(&self, mut v: serde_json::Value) -> anyhow::Result<()> {
        // Tag requests so errors on the IPC stream can be attributed.
        if v.get("request_id").is_none() {
            let id = self.request_id.fetch_add(1, Ordering::Relaxed);
            if let serde_json::Value::Object(ref mut o) = v {
                o.insert("request_id".to_string(), serde_json::Value::from(id));
            }
        }
        let mut w = self.writer.lock().await;
        let mut line = serde_json::to_vec(&v).context("encode mpv json")?;
        line.push(b'\n');
        w.write_all(&line).await.context("write mpv ipc")?;
        w.flush().await.context("flush mpv ipc")?;
        Ok(())
    }
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn connect_with_retry(path: &Path) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e)
                        .with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop(reader: tokio::io::ReadHalf<UnixStream>, event_tx: mpsc::Sender<Event>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(&line) {
            // mpv command replies: {"request_id":..., "error":"..."}
            if let (Some(_rid), Some(err)) = (v.get("request_id"), v.get("error"))
                && let Some(err_s) = err.as_str()
                && err_s != "success"
            {
                let _ = event_tx
                    .send(Event::Player(PlayerEvent::Error(format!(
                        "mpv ipc error: {err_s}"
                    ))))
                    .await;
            }
            if let Some(pe) = map_mpv_event(&v) {
                // A file that failed to load still has to end, or playback
                // would stall on it forever.
                let failed_load = matches!(&pe, PlayerEvent::Error(_))
                    && v.get("event").and_then(|e| e.as_str()) == Some("end-file");
                let _ = event_tx.send(Event::Player(pe)).await;
                if failed_load {
                    let _ = event_tx.send(Event::Player(PlayerEvent::Ended)).await;
                }
            }
        }
    }
    // The socket closing means mpv itself is gone. Report it like a
    // failed file so playback winds down instead of waiting on a dead
    // process.
    let _ = event_tx
        .send(Event::Player(PlayerEvent::Error(
            "mpv connection closed".to_string(),
        )))
        .await;
    let _ = event_tx.send(Event::Player(PlayerEvent::Ended)).await;
}

fn map_mpv_event(v: &serde_json::Value) -> Option<PlayerEvent> {
    match v.get("event")?.as_str()? {
        "property-change" => {
            let name = v.get("name")?.as_str()?;
            match name {
                "time-pos" => Some(PlayerEvent::Position {
                    seconds: v.get("data")?.as_f64().unwrap_or(0.0),
                }),
                "duration" => Some(PlayerEvent::Duration {
                    seconds: v.get("data")?.as_f64().unwrap_or(0.0),
                }),
                "pause" => {
                    let paused = v.get("data")?.as_bool().unwrap_or(false);
                    Some(if paused {
                        PlayerEvent::Paused
                    } else {
                        PlayerEvent::Started
                    })
                }
                _ => None,
            }
        }
        "end-file" => {
            // Only a natural end counts as Ended. A stop or redirect (for
            // example when a new file replaces the current one) must not
            // look like the track finishing.
            let reason = v.get("reason").and_then(|x| x.as_str()).unwrap_or("");
            match reason {
                "eof" => Some(PlayerEvent::Ended),
                "error" => {
                    let err = v.get("error").and_then(|x| x.as_str()).unwrap_or("unknown");
                    Some(PlayerEvent::Error(format!("mpv end-file error: {err}")))
                }
                _ => None,
            }
        }
        "log-message" => {
            let level = v.get("level")?.as_str().unwrap_or("info");
            let text = v.get("text")?.as_str().unwrap_or("").trim();
            if (level == "warn" || level == "error") && !text.is_empty() {
                Some(PlayerEvent::Error(format!("mpv {level}: {text}")))
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_position_and_duration() {
        let v = json!({"event":"property-change","name":"time-pos","data":12.5});
        assert!(matches!(
            map_mpv_event(&v),
            Some(PlayerEvent::Position { seconds }) if seconds == 12.5
        ));

        let v = json!({"event":"property-change","name":"duration","data":240.0});
        assert!(matches!(
            map_mpv_event(&v),
            Some(PlayerEvent::Duration { seconds }) if seconds == 240.0
        ));

        // time-pos goes null between files
        let v = json!({"event":"property-change","name":"time-pos","data":null});
        assert!(matches!(
            map_mpv_event(&v),
            Some(PlayerEvent::Position { seconds }) if seconds == 0.0
        ));
    }

    #[test]
    fn test_map_pause_toggle() {
        let v = json!({"event":"property-change","name":"pause","data":true});
        assert!(matches!(map_mpv_event(&v), Some(PlayerEvent::Paused)));

        let v = json!({"event":"property-change","name":"pause","data":false});
        assert!(matches!(map_mpv_event(&v), Some(PlayerEvent::Started)));
    }

    #[test]
    fn test_map_end_of_file() {
        let v = json!({"event":"end-file","reason":"eof"});
        assert!(matches!(map_mpv_event(&v), Some(PlayerEvent::Ended)));

        // Replacing the current file stops it; that is not a finished track.
        let v = json!({"event":"end-file","reason":"stop"});
        assert!(map_mpv_event(&v).is_none());

        let v = json!({"event":"end-file","reason":"error","error":"loading failed"});
        assert!(matches!(map_mpv_event(&v), Some(PlayerEvent::Error(_))));
    }

    #[test]
    fn test_unknown_events_are_ignored() {
        let v = json!({"event":"client-message"});
        assert!(map_mpv_event(&v).is_none());
        let v = json!({"request_id":3,"error":"success"});
        assert!(map_mpv_event(&v).is_none());
    }

    #[tokio::test]
    async fn test_closed_socket_ends_playback() {
        let (tx, mut rx) = mpsc::channel(8);
        let (ours, peer) = UnixStream::pair().unwrap();
        let (reader, _writer) = tokio::io::split(ours);

        // A crashed mpv looks like the peer end going away.
        drop(peer);
        read_events_loop(reader, tx).await;

        assert!(matches!(
            rx.recv().await,
            Some(Event::Player(PlayerEvent::Error(_)))
        ));
        assert!(matches!(
            rx.recv().await,
            Some(Event::Player(PlayerEvent::Ended))
        ));
    }
}

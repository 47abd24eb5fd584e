use anyhow::Context;
use rusqlite::{params, Connection};
use std::path::Path;

/// Persisted lyrics, keyed by derived track identity.
pub struct LyricsStore {
    conn: Connection,
}

impl LyricsStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS lyrics (
  song_id TEXT PRIMARY KEY,
  lyrics TEXT
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    /// Insert or overwrite the lyrics for a track. Returns whether a record
    /// already existed.
    pub fn upsert(&self, song_id: &str, lyrics: &str) -> anyhow::Result<bool> {
        let existed = self.exists(song_id)?;
        self.conn
            .execute(
                r#"
INSERT INTO lyrics(song_id, lyrics)
VALUES(?1, ?2)
ON CONFLICT(song_id) DO UPDATE SET
  lyrics=excluded.lyrics
"#,
                params![song_id, lyrics],
            )
            .context("save lyrics")?;
        Ok(existed)
    }

    fn exists(&self, song_id: &str) -> anyhow::Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM lyrics WHERE song_id=?1")
            .context("prepare exists")?;
        let mut rows = stmt.query(params![song_id]).context("query exists")?;
        Ok(rows.next().context("read exists row")?.is_some())
    }

    /// Stored lyrics for a track, or `None` when nothing is stored.
    pub fn get(&self, song_id: &str) -> anyhow::Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT lyrics FROM lyrics WHERE song_id=?1")?;
        let mut rows = stmt.query(params![song_id])?;
        if let Some(row) = rows.next()? {
            let lyrics: Option<String> = row.get(0)?;
            Ok(lyrics)
        } else {
            Ok(None)
        }
    }

    /// Remove the record for a track. Returns whether one existed.
    pub fn delete(&self, song_id: &str) -> anyhow::Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM lyrics WHERE song_id=?1", params![song_id])
            .context("delete lyrics")?;
        Ok(n > 0)
    }

    /// Every stored (song_id, lyrics) pair.
    pub fn all(&self) -> anyhow::Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare("SELECT song_id, lyrics FROM lyrics")?;
        let records = stmt
            .query_map([], |row| {
                let song_id: String = row.get(0)?;
                let lyrics: Option<String> = row.get(1)?;
                Ok((song_id, lyrics.unwrap_or_default()))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }
}

//! Append-only fetch log stored as newline-delimited JSON.
//!
//! One line per fetch call, plus one summary line per fetch-all run. Lines
//! are never rewritten; a partial per-item line stays partial forever.

use crate::error::{Error, Result};
use crate::models::LogEntry;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one JSON line.
    #[instrument(level = "debug", skip_all, fields(source = %entry.source, category = %entry.category))]
    pub async fn append(&self, entry: &LogEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry).map_err(|e| {
            Error::store_io(&self.path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::store_io(parent, e))?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| Error::store_io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| Error::store_io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| Error::store_io(&self.path, e))?;
        debug!("Appended log entry");
        Ok(())
    }

    /// Parse every line. The first malformed line fails the whole read.
    ///
    /// Blank lines are ignored and a missing file reads as an empty log.
    pub async fn read_all(&self) -> Result<Vec<LogEntry>> {
        let Some(text) = self.read_text().await? else {
            return Ok(Vec::new());
        };
        parse_lines(&text)
    }

    /// Parse every line, skipping malformed ones.
    ///
    /// Returns the entries and the number of lines skipped.
    pub async fn read_all_tolerant(&self) -> Result<(Vec<LogEntry>, usize)> {
        let Some(text) = self.read_text().await? else {
            return Ok((Vec::new(), 0));
        };
        let mut entries = Vec::new();
        let mut skipped = 0;
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(line = idx + 1, error = %e, path = %self.path.display(), "Skipping malformed log line");
                    skipped += 1;
                }
            }
        }
        Ok((entries, skipped))
    }

    async fn read_text(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::store_io(&self.path, e)),
        }
    }
}

fn parse_lines(text: &str) -> Result<Vec<LogEntry>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| Error::LogParse {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

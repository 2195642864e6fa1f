//! File-backed storage gateway.
//!
//! # Overview
//!
//! All persistence goes through the [`Storage`] trait. [`FsStorage`] is the
//! production implementation: one directory per record kind under a project
//! root, one JSON document holding the whole current collection, and one
//! history directory collecting per-record snapshots taken before mutations.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   tasks/
//!     current-tasks.json
//!     task-history/
//!       task-7-2026-03-01T09-00-00-000Z.json
//!   sessions/
//!     current-sessions.json
//!     session-history/
//! ```
//!
//! # Design
//!
//! Current-document writes go to a temp file in the same directory and are
//! renamed into place, so readers see either the old document or the new
//! one, never a torn write. A file that exists but fails to parse surfaces
//! as [`StorageError::Corrupt`], never as an absent document.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Timestamp format embedded in archive file names. Colons are not portable
/// in file names, so the time-of-day separators are dashes.
const HISTORY_TS_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3fZ";
/// Rendered length of [`HISTORY_TS_FORMAT`], e.g. `2026-03-01T09-00-00-000Z`.
const HISTORY_TS_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but its contents are not JSON.
    #[error("corrupt document at {}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode {kind} document")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One archived snapshot of a record, newest first in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub file_name: String,
    pub archived_at: DateTime<Utc>,
}

/// Persistence seam for collection documents and record snapshots.
///
/// `kind` is the singular entity noun (`task`, `session`); implementations
/// derive their storage locations from it.
pub trait Storage: Send + Sync {
    /// The current document for `kind`, or `None` when none was ever
    /// written.
    ///
    /// # Errors
    ///
    /// Fails when the document cannot be read, or exists but is corrupt.
    /// Corruption is never reported as absence.
    fn read(&self, kind: &str) -> Result<Option<String>, StorageError>;

    /// Atomically replace the current document for `kind`.
    ///
    /// # Errors
    ///
    /// Fails when the document or its directory cannot be written.
    fn write(&self, kind: &str, contents: &str) -> Result<(), StorageError>;

    /// Store one record snapshot in the kind's history directory and return
    /// the archive file name.
    ///
    /// # Errors
    ///
    /// Fails when the snapshot cannot be written.
    fn archive(
        &self,
        kind: &str,
        id: &str,
        contents: &str,
        at: DateTime<Utc>,
    ) -> Result<String, StorageError>;

    /// Archived snapshots for one record id, newest first.
    ///
    /// # Errors
    ///
    /// Fails when the history directory cannot be listed. A history
    /// directory that does not exist yet is an empty history, not an error.
    fn list_history(&self, kind: &str, id: &str) -> Result<Vec<HistoryEntry>, StorageError>;
}

/// Directory-per-kind storage rooted at a project directory.
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: &str) -> PathBuf {
        self.root.join(format!("{kind}s"))
    }

    fn current_path(&self, kind: &str) -> PathBuf {
        self.kind_dir(kind).join(format!("current-{kind}s.json"))
    }

    fn history_dir(&self, kind: &str) -> PathBuf {
        self.kind_dir(kind).join(format!("{kind}-history"))
    }
}

impl Storage for FsStorage {
    fn read(&self, kind: &str) -> Result<Option<String>, StorageError> {
        let path = self.current_path(kind);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Io {
                    action: "read",
                    path,
                    source,
                });
            }
        };
        // Syntax check only; callers parse the concrete shape. This is what
        // keeps a half-written or mangled file from masquerading as empty.
        if let Err(source) = serde_json::from_str::<serde::de::IgnoredAny>(&text) {
            return Err(StorageError::Corrupt { path, source });
        }
        Ok(Some(text))
    }

    fn write(&self, kind: &str, contents: &str) -> Result<(), StorageError> {
        let dir = self.kind_dir(kind);
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            action: "create",
            path: dir.clone(),
            source,
        })?;

        let path = self.current_path(kind);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(|source| StorageError::Io {
            action: "write",
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io {
            action: "replace",
            path: path.clone(),
            source,
        })?;

        debug!(kind, path = %path.display(), bytes = contents.len(), "wrote current document");
        Ok(())
    }

    fn archive(
        &self,
        kind: &str,
        id: &str,
        contents: &str,
        at: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let dir = self.history_dir(kind);
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            action: "create",
            path: dir.clone(),
            source,
        })?;

        let stamp = at.format(HISTORY_TS_FORMAT).to_string();
        let mut file_name = format!("{id}-{stamp}.json");
        // Same-millisecond snapshots of one record get a numeric suffix
        // instead of overwriting each other.
        let mut counter = 1u32;
        while dir.join(&file_name).exists() {
            file_name = format!("{id}-{stamp}-{counter}.json");
            counter += 1;
        }

        let path = dir.join(&file_name);
        fs::write(&path, contents).map_err(|source| StorageError::Io {
            action: "write",
            path: path.clone(),
            source,
        })?;

        debug!(kind, id, file = file_name.as_str(), "archived record snapshot");
        Ok(file_name)
    }

    fn list_history(&self, kind: &str, id: &str) -> Result<Vec<HistoryEntry>, StorageError> {
        let dir = self.history_dir(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    action: "list",
                    path: dir,
                    source,
                });
            }
        };

        // "{id}-" keeps task-1 from matching task-11's files.
        let prefix = format!("{id}-");
        let mut history = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StorageError::Io {
                action: "list",
                path: dir.clone(),
                source,
            })?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(parsed) = parse_history_name(&file_name, &prefix) {
                history.push(parsed);
            }
        }

        // Newest first. Entries from the same millisecond order by name,
        // which is stable but does not promise strict write order.
        history.sort_by(|a, b| (b.archived_at, &b.file_name).cmp(&(a.archived_at, &a.file_name)));
        Ok(history)
    }
}

fn parse_history_name(file_name: &str, prefix: &str) -> Option<HistoryEntry> {
    let rest = file_name.strip_prefix(prefix)?;
    let rest = rest.strip_suffix(".json")?;
    // A trailing "-<n>" collision suffix does not change the timestamp.
    let stamp = rest.get(..HISTORY_TS_LEN)?;
    let parsed = NaiveDateTime::parse_from_str(stamp, HISTORY_TS_FORMAT).ok()?;
    Some(HistoryEntry {
        file_name: file_name.to_string(),
        archived_at: parsed.and_utc(),
    })
}

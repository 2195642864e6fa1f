//! Repository event publication.
//!
//! Repositories publish a [`RepoEvent`] after the corresponding write has
//! landed on disk, so consumers never observe an event for a mutation that
//! did not happen. Publication is strictly best-effort: a failing bus is
//! logged at warn level and never fails the operation that triggered it.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::model::progress::ProgressState;

/// Emitted after a repository write lands on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RepoEvent {
    RecordCreated {
        kind: &'static str,
        id: String,
    },
    RecordUpdated {
        kind: &'static str,
        id: String,
    },
    RecordDeleted {
        kind: &'static str,
        id: String,
    },
    ProgressChanged {
        id: String,
        from: ProgressState,
        to: ProgressState,
        percentage: u8,
    },
    FocusChanged {
        id: Option<String>,
    },
    CommitAssociated {
        id: String,
        commit: String,
    },
    HierarchyChanged,
}

#[derive(Debug, Clone, Error)]
#[error("event publication failed: {reason}")]
pub struct PublishError {
    pub reason: String,
}

/// Consumer seam for repository events.
pub trait EventBus: Send + Sync {
    /// Deliver one event. Called after the write it describes has landed.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the publishing repository logs the failure
    /// and carries on.
    fn publish(&self, event: &RepoEvent) -> Result<(), PublishError>;
}

/// Drops every event. The default bus when none is injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBus;

impl EventBus for NullBus {
    fn publish(&self, _event: &RepoEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Writes each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogBus;

impl EventBus for LogBus {
    fn publish(&self, event: &RepoEvent) -> Result<(), PublishError> {
        match serde_json::to_string(event) {
            Ok(payload) => {
                info!(target: "docket::events", payload = payload.as_str(), "event");
                Ok(())
            }
            Err(err) => Err(PublishError {
                reason: err.to_string(),
            }),
        }
    }
}

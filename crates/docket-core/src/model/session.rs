use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Collection, Record};
use crate::validate::{self, ValidationReport};

/// One recorded working session, optionally tied to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub id: String,
    pub task_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub notes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            id: String::new(),
            task_id: None,
            started_at: DateTime::<Utc>::default(),
            ended_at: None,
            notes: Vec::new(),
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

impl Session {
    #[must_use]
    pub fn new(id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            started_at,
            ..Self::default()
        }
    }
}

/// Partial update for a session. Set list fields replace the whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPatch {
    pub task_id: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub notes: Option<Vec<String>>,
}

impl Record for Session {
    const KIND: &'static str = "session";
    type Patch = SessionPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: SessionPatch) {
        if let Some(task_id) = patch.task_id {
            self.task_id = Some(task_id);
        }
        if let Some(ended_at) = patch.ended_at {
            self.ended_at = Some(ended_at);
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    fn validate(&self) -> ValidationReport {
        validate::validate_session(self)
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = at;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// The whole current-sessions document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCollection {
    pub sessions: Vec<Session>,
}

impl Collection for SessionCollection {
    type Record = Session;

    fn records(&self) -> &[Session] {
        &self.sessions
    }

    fn records_mut(&mut self) -> &mut Vec<Session> {
        &mut self.sessions
    }
}

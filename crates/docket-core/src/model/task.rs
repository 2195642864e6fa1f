#![allow(clippy::missing_const_for_fn, clippy::must_use_candidate)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::hierarchy::Hierarchy;
use super::progress::{Progress, ProgressState};
use super::{Collection, ParseEnumError, Record, normalize};
use crate::validate::{self, ValidationReport};

/// Lifecycle summary derived from the progress state, never stored on its
/// own: a task cannot carry a status that contradicts its progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl From<ProgressState> for Status {
    fn from(state: ProgressState) -> Self {
        match state {
            ProgressState::NotStarted => Self::Pending,
            ProgressState::Completed => Self::Completed,
            ProgressState::InDevelopment | ProgressState::DevComplete | ProgressState::InReview => {
                Self::InProgress
            }
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

/// How strongly a task depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStrength {
    /// Blocks completion of the dependent task.
    Strong,
    /// Advisory ordering only; never blocks.
    Weak,
}

impl Default for DependencyStrength {
    fn default() -> Self {
        Self::Strong
    }
}

impl DependencyStrength {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Weak => "weak",
        }
    }
}

impl fmt::Display for DependencyStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyStrength {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "strong" => Ok(Self::Strong),
            "weak" => Ok(Self::Weak),
            _ => Err(ParseEnumError {
                expected: "dependency strength",
                got: s.to_string(),
            }),
        }
    }
}

/// One edge in the dependency graph: this task waits on `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    #[serde(default)]
    pub strength: DependencyStrength,
}

impl Dependency {
    pub fn strong(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            strength: DependencyStrength::Strong,
        }
    }

    pub fn weak(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            strength: DependencyStrength::Weak,
        }
    }
}

/// All persisted fields for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: u8,
    pub dependencies: Vec<Dependency>,
    pub estimated_hours: Option<f64>,
    pub tags: Vec<String>,
    pub commits: Vec<String>,
    pub progress: Progress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: None,
            priority: 3,
            dependencies: Vec::new(),
            estimated_hours: None,
            tags: Vec::new(),
            commits: Vec::new(),
            progress: Progress::default(),
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

impl Task {
    /// Build a new task with the given id and title at middle priority.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Lifecycle summary derived from the progress state.
    pub fn status(&self) -> Status {
        Status::from(self.progress.state)
    }
}

/// Partial update for a task. Unset fields keep the record's value; set list
/// fields replace the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<u8>,
    pub dependencies: Option<Vec<Dependency>>,
    pub estimated_hours: Option<f64>,
    pub tags: Option<Vec<String>>,
}

impl Record for Task {
    const KIND: &'static str = "task";
    type Patch = TaskPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(dependencies) = patch.dependencies {
            self.dependencies = dependencies;
        }
        if let Some(estimated_hours) = patch.estimated_hours {
            self.estimated_hours = Some(estimated_hours);
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    fn validate(&self) -> ValidationReport {
        validate::validate_task(self)
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = at;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// The whole current-tasks document: records plus sibling metadata that
/// record mutations carry through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskCollection {
    pub tasks: Vec<Task>,
    pub hierarchy: Option<Hierarchy>,
    pub current_focus: Option<String>,
}

impl Collection for TaskCollection {
    type Record = Task;

    fn records(&self) -> &[Task] {
        &self.tasks
    }

    fn records_mut(&mut self) -> &mut Vec<Task> {
        &mut self.tasks
    }
}

#![allow(clippy::missing_const_for_fn, clippy::must_use_candidate)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, normalize};

/// The five development states a task moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    NotStarted,
    InDevelopment,
    DevComplete,
    InReview,
    Completed,
}

impl ProgressState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InDevelopment => "in_development",
            Self::DevComplete => "dev_complete",
            Self::InReview => "in_review",
            Self::Completed => "completed",
        }
    }

    /// Built-in completion percentage for a state, used when a transition
    /// supplies none and no config override exists.
    pub const fn default_percentage(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::InDevelopment => 25,
            Self::DevComplete => 50,
            Self::InReview => 75,
            Self::Completed => 100,
        }
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// Valid transitions:
    /// - `not_started -> in_development`
    /// - `in_development -> dev_complete`
    /// - `dev_complete -> in_review`
    /// - `dev_complete -> in_development` (rework)
    /// - `in_review -> completed`
    /// - `in_review -> in_development` (rework)
    /// - `completed -> in_development` (reopen, only when `allow_reopen`)
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] naming both states when the transition
    /// is not in the table above.
    pub fn can_transition_to(
        self,
        target: Self,
        allow_reopen: bool,
    ) -> Result<(), InvalidTransition> {
        if self == target {
            return Err(InvalidTransition {
                from: self,
                to: target,
                reason: "no-op transition is not allowed",
            });
        }

        if self == Self::Completed && target == Self::InDevelopment && !allow_reopen {
            return Err(InvalidTransition {
                from: self,
                to: target,
                reason: "reopening completed tasks is disabled",
            });
        }

        let allowed = matches!(
            (self, target),
            (Self::NotStarted, Self::InDevelopment)
                | (Self::InDevelopment, Self::DevComplete)
                | (Self::DevComplete, Self::InReview)
                | (Self::DevComplete, Self::InDevelopment)
                | (Self::InReview, Self::Completed)
                | (Self::InReview, Self::InDevelopment)
                | (Self::Completed, Self::InDevelopment)
        );

        if allowed {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
                reason: "transition not allowed by lifecycle rules",
            })
        }
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "not_started" => Ok(Self::NotStarted),
            "in_development" => Ok(Self::InDevelopment),
            "dev_complete" => Ok(Self::DevComplete),
            "in_review" => Ok(Self::InReview),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError {
                expected: "progress state",
                got: s.to_string(),
            }),
        }
    }
}

/// One applied transition, kept in the task's append-only progress history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub from: ProgressState,
    pub to: ProgressState,
    pub percentage: u8,
    pub at: DateTime<Utc>,
}

/// Progress tracking for one task: current state, completion percentage, and
/// the transitions applied so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub state: ProgressState,
    pub percentage: u8,
    pub history: Vec<ProgressEvent>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            state: ProgressState::NotStarted,
            percentage: 0,
            history: Vec::new(),
        }
    }
}

/// Error returned when a progress transition is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: ProgressState,
    pub to: ProgressState,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid transition from '{}' to '{}': {}",
            self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}

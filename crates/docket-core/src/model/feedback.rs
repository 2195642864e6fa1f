use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Collection, Record};
use crate::validate::{self, ValidationReport};

/// A piece of recorded feedback, optionally tied to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feedback {
    pub id: String,
    pub task_id: Option<String>,
    pub body: String,
    /// 1 (worst) to 5 (best), when the feedback carries a score.
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Feedback {
    fn default() -> Self {
        Self {
            id: String::new(),
            task_id: None,
            body: String::new(),
            rating: None,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

impl Feedback {
    #[must_use]
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a feedback item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackPatch {
    pub task_id: Option<String>,
    pub body: Option<String>,
    pub rating: Option<u8>,
}

impl Record for Feedback {
    const KIND: &'static str = "feedback-item";
    type Patch = FeedbackPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: FeedbackPatch) {
        if let Some(task_id) = patch.task_id {
            self.task_id = Some(task_id);
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(rating) = patch.rating {
            self.rating = Some(rating);
        }
    }

    fn validate(&self) -> ValidationReport {
        validate::validate_feedback(self)
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = at;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// The whole current-feedback-items document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackCollection {
    pub items: Vec<Feedback>,
}

impl Collection for FeedbackCollection {
    type Record = Feedback;

    fn records(&self) -> &[Feedback] {
        &self.items
    }

    fn records_mut(&mut self) -> &mut Vec<Feedback> {
        &mut self.items
    }
}

#[cfg(test)]
mod tests {
    use super::{Feedback, FeedbackPatch, Record};

    #[test]
    fn patch_updates_body_and_rating() {
        let mut feedback = Feedback::new("fb-1", "first draft");
        feedback.apply_patch(FeedbackPatch {
            body: Some("second draft".to_string()),
            rating: Some(4),
            ..FeedbackPatch::default()
        });
        assert_eq!(feedback.body, "second draft");
        assert_eq!(feedback.rating, Some(4));
    }

    #[test]
    fn kind_pluralizes_cleanly() {
        // Storage paths derive from KIND by appending "s".
        assert_eq!(Feedback::KIND, "feedback-item");
    }
}

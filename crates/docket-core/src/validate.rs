//! Field-level validation.
//!
//! # Overview
//!
//! Validators are pure: they look at one value, return a
//! [`ValidationReport`], and never touch storage or the clock. Reports
//! accumulate every problem found rather than stopping at the first, so a
//! caller can surface the complete list in a single error. Cross-record
//! checks (does a dependency exist, is a reference dangling) belong to the
//! repository layer, not here.

use crate::model::feedback::Feedback;
use crate::model::hierarchy::Hierarchy;
use crate::model::session::Session;
use crate::model::task::Task;

/// Accumulated verdict for one value. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    problems: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    #[must_use]
    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    #[must_use]
    pub fn into_problems(self) -> Vec<String> {
        self.problems
    }

    fn push(&mut self, problem: impl Into<String>) {
        self.problems.push(problem.into());
    }
}

/// Record ids are a lowercase alphanumeric prefix, a dash, and a number:
/// `task-42`, `sess-7`. The prefix must start with a letter.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    let Some((prefix, number)) = id.split_once('-') else {
        return false;
    };
    let mut chars = prefix.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    starts_with_letter
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && !number.is_empty()
        && number.chars().all(|c| c.is_ascii_digit())
}

fn check_id(report: &mut ValidationReport, id: &str) {
    if !is_valid_id(id) {
        report.push(format!(
            "id '{id}' must be <prefix>-<number>, like 'task-42'"
        ));
    }
}

#[must_use]
pub fn validate_task(task: &Task) -> ValidationReport {
    let mut report = ValidationReport::ok();
    check_id(&mut report, &task.id);
    if task.title.trim().is_empty() {
        report.push("title must not be empty");
    }
    if !(1..=5).contains(&task.priority) {
        report.push(format!("priority {} out of range 1..=5", task.priority));
    }
    if let Some(hours) = task.estimated_hours {
        if !hours.is_finite() || hours < 0.0 {
            report.push(format!("estimated hours {hours} must be finite and non-negative"));
        }
    }
    if task.progress.percentage > 100 {
        report.push(format!(
            "progress percentage {} exceeds 100",
            task.progress.percentage
        ));
    }
    // Format only. Whether the referenced task exists is the repository's
    // question, answered at write time against the loaded collection.
    for dep in &task.dependencies {
        if !is_valid_id(&dep.id) {
            report.push(format!("dependency id '{}' is not a valid record id", dep.id));
        }
    }
    report
}

#[must_use]
pub fn validate_hierarchy(hierarchy: &Hierarchy) -> ValidationReport {
    let mut report = ValidationReport::ok();
    let mut seen = std::collections::HashSet::new();
    for (index, level) in hierarchy.levels.iter().enumerate() {
        let name = level.name.trim();
        if name.is_empty() {
            report.push(format!("level {index} has an empty name"));
        } else if !seen.insert(name) {
            report.push(format!("duplicate level name '{name}'"));
        }
    }
    for (child, parent) in &hierarchy.parents {
        if !is_valid_id(child) {
            report.push(format!("child id '{child}' is not a valid record id"));
        }
        if !is_valid_id(parent) {
            report.push(format!("parent id '{parent}' is not a valid record id"));
        }
        if child == parent {
            report.push(format!("task '{child}' cannot be its own parent"));
        }
    }
    report
}

#[must_use]
pub fn validate_session(session: &Session) -> ValidationReport {
    let mut report = ValidationReport::ok();
    check_id(&mut report, &session.id);
    if let Some(task_id) = &session.task_id {
        if !is_valid_id(task_id) {
            report.push(format!("task id '{task_id}' is not a valid record id"));
        }
    }
    if let Some(ended_at) = session.ended_at {
        if ended_at < session.started_at {
            report.push("ended_at precedes started_at");
        }
    }
    report
}

#[must_use]
pub fn validate_feedback(feedback: &Feedback) -> ValidationReport {
    let mut report = ValidationReport::ok();
    check_id(&mut report, &feedback.id);
    if let Some(task_id) = &feedback.task_id {
        if !is_valid_id(task_id) {
            report.push(format!("task id '{task_id}' is not a valid record id"));
        }
    }
    if feedback.body.trim().is_empty() {
        report.push("body must not be empty");
    }
    if let Some(rating) = feedback.rating {
        if !(1..=5).contains(&rating) {
            report.push(format!("rating {rating} out of range 1..=5"));
        }
    }
    report
}

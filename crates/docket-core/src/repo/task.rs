//! Task repository: dependency-aware operations over the tasks document.
//!
//! # Overview
//!
//! [`TaskRepository`] layers the task domain rules on top of the generic
//! repository: the progress state machine, completion gating on strong
//! dependencies, graph checks, hierarchy metadata, the current-focus
//! pointer, and commit associations. All of it operates on the single
//! tasks document, so domain mutations carry sibling fields (hierarchy,
//! focus) through untouched.
//!
//! Completion gating looks at direct strong dependencies only; the full
//! transitive picture, cycles included, comes from
//! [`TaskRepository::check_dependencies`].

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ProjectConfig;
use crate::error::RepoError;
use crate::events::{EventBus, RepoEvent};
use crate::graph::{DependencyGraph, DependencyReport};
use crate::model::Record;
use crate::model::hierarchy::Hierarchy;
use crate::model::progress::{ProgressEvent, ProgressState};
use crate::model::task::{DependencyStrength, Task, TaskCollection, TaskPatch};
use crate::policy::FaultPolicy;
use crate::repo::base::Repository;
use crate::store::{HistoryEntry, Storage};
use crate::validate;

pub struct TaskRepository {
    base: Repository<TaskCollection>,
    config: ProjectConfig,
}

impl TaskRepository {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, config: ProjectConfig) -> Self {
        Self {
            base: Repository::new(storage),
            config,
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventBus>) -> Self {
        self.base = self.base.with_events(events);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn FaultPolicy>) -> Self {
        self.base = self.base.with_policy(policy);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Validate and store a new task.
    ///
    /// Dependency ids are checked for format only: pointing at a task that
    /// does not exist yet is allowed, and surfaces later through
    /// [`TaskRepository::check_dependencies`] and the completion gate.
    ///
    /// # Errors
    ///
    /// [`RepoError::Validation`] for field problems,
    /// [`RepoError::DataConsistency`] for a duplicate id, storage faults
    /// otherwise.
    pub fn create_task(&self, task: Task) -> Result<Task, RepoError> {
        let id = task.id.clone();
        self.base.guard("create_task", Some(&id), None, || {
            let mut collection = self.base.load()?;
            let created = Repository::insert_record(&mut collection, task, Utc::now())?;
            self.base.store(&collection)?;
            self.base.notify(&RepoEvent::RecordCreated {
                kind: Task::KIND,
                id: created.id.clone(),
            });
            Ok(created)
        })
    }

    /// The task with `id`.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] for an unknown id, storage faults otherwise.
    pub fn find_task(&self, id: &str) -> Result<Task, RepoError> {
        self.base
            .guard("find_task", Some(id), None, || self.base.fetch(id))
    }

    /// Every task, in document order.
    ///
    /// # Errors
    ///
    /// Storage faults. A policy may recover this read to an empty list.
    pub fn list_tasks(&self) -> Result<Vec<Task>, RepoError> {
        self.base.guard("list_tasks", None, Some(Vec::new()), || {
            Ok(self.base.load()?.tasks)
        })
    }

    /// Tasks matching `predicate`, in document order.
    ///
    /// # Errors
    ///
    /// Storage faults. A policy may recover this read to an empty list.
    pub fn find_tasks_where(
        &self,
        predicate: impl Fn(&Task) -> bool,
    ) -> Result<Vec<Task>, RepoError> {
        self.base
            .guard("find_tasks_where", None, Some(Vec::new()), || {
                let collection = self.base.load()?;
                Ok(collection
                    .tasks
                    .into_iter()
                    .filter(|task| predicate(task))
                    .collect())
            })
    }

    /// Apply a patch to the task with `id`, archiving the previous version.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] for an unknown id, [`RepoError::Validation`]
    /// when the patched task is invalid, storage faults otherwise.
    pub fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task, RepoError> {
        self.base.guard("update_task", Some(id), None, || {
            let now = Utc::now();
            let mut collection = self.base.load()?;
            let (previous, updated) = Repository::patch_record(&mut collection, id, patch, now)?;
            self.base.archive_record(&previous, now)?;
            self.base.store(&collection)?;
            self.base.notify(&RepoEvent::RecordUpdated {
                kind: Task::KIND,
                id: updated.id.clone(),
            });
            Ok(updated)
        })
    }

    /// Remove the task with `id`, archiving its final state. Clears the
    /// current focus when it pointed at the removed task.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] for an unknown id, storage faults otherwise.
    pub fn delete_task(&self, id: &str) -> Result<(), RepoError> {
        self.base.guard("delete_task", Some(id), None, || {
            let now = Utc::now();
            let mut collection = self.base.load()?;
            let removed = Repository::remove_record(&mut collection, id)?;
            let focus_cleared = clear_stale_focus(&mut collection, id);
            self.base.archive_record(&removed, now)?;
            self.base.store(&collection)?;
            self.base.notify(&RepoEvent::RecordDeleted {
                kind: Task::KIND,
                id: removed.id.clone(),
            });
            if focus_cleared {
                self.base.notify(&RepoEvent::FocusChanged { id: None });
            }
            Ok(())
        })
    }

    /// Insert several tasks with one document write, all or nothing.
    ///
    /// # Errors
    ///
    /// Same as [`TaskRepository::create_task`], for the first offending
    /// task.
    pub fn create_tasks(&self, tasks: Vec<Task>) -> Result<Vec<Task>, RepoError> {
        self.base.create_many(tasks)
    }

    /// Apply several patches with one document write, in order, all or
    /// nothing.
    ///
    /// # Errors
    ///
    /// Same as [`TaskRepository::update_task`], for the first offending
    /// patch.
    pub fn update_tasks(&self, updates: Vec<(String, TaskPatch)>) -> Result<Vec<Task>, RepoError> {
        self.base.update_many(updates)
    }

    /// Remove several tasks with one document write, returning how many
    /// existed. Unknown ids are skipped. Clears the current focus when it
    /// pointed at a removed task.
    ///
    /// # Errors
    ///
    /// Storage faults.
    pub fn delete_tasks(&self, ids: &[String]) -> Result<usize, RepoError> {
        self.base.guard("delete_tasks", None, None, || {
            let now = Utc::now();
            let mut collection = self.base.load()?;
            let mut removed = Vec::new();
            for id in ids {
                match Repository::remove_record(&mut collection, id) {
                    Ok(task) => removed.push(task),
                    Err(RepoError::NotFound { .. }) => {
                        debug!(id = id.as_str(), "bulk delete skipping missing task");
                    }
                    Err(err) => return Err(err),
                }
            }
            if removed.is_empty() {
                return Ok(0);
            }

            let mut focus_cleared = false;
            for task in &removed {
                focus_cleared |= clear_stale_focus(&mut collection, &task.id);
            }
            for task in &removed {
                self.base.archive_record(task, now)?;
            }
            self.base.store(&collection)?;
            for task in &removed {
                self.base.notify(&RepoEvent::RecordDeleted {
                    kind: Task::KIND,
                    id: task.id.clone(),
                });
            }
            if focus_cleared {
                self.base.notify(&RepoEvent::FocusChanged { id: None });
            }
            Ok(removed.len())
        })
    }

    /// Archived snapshots for `id`, newest first.
    ///
    /// # Errors
    ///
    /// Storage faults. A policy may recover this read to an empty list.
    pub fn history(&self, id: &str) -> Result<Vec<HistoryEntry>, RepoError> {
        self.base.history(id)
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    /// Move the task with `id` to `target`, appending to its progress
    /// history and archiving the previous version.
    ///
    /// When `percentage` is `None`, the configured per-state override
    /// applies, falling back to the built-in ladder. Completing a task
    /// requires every direct strong dependency to be completed.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] for an unknown id; [`RepoError::Validation`]
    /// for an invalid transition (naming both states), an unmet strong
    /// dependency, or a percentage above 100; storage faults otherwise.
    pub fn update_task_progress(
        &self,
        id: &str,
        target: ProgressState,
        percentage: Option<u8>,
    ) -> Result<Task, RepoError> {
        self.base
            .guard("update_task_progress", Some(id), None, || {
                let now = Utc::now();
                let mut collection = self.base.load()?;

                let Some(position) = collection.tasks.iter().position(|task| task.id == id)
                else {
                    return Err(RepoError::not_found(Task::KIND, id));
                };

                let from = collection.tasks[position].progress.state;
                from.can_transition_to(target, self.config.progress.allow_reopen)
                    .map_err(|err| {
                        RepoError::validation(format!("task '{id}'"), vec![err.to_string()])
                    })?;

                if target == ProgressState::Completed {
                    let unmet = incomplete_strong_dependencies(
                        &collection.tasks[position],
                        &collection.tasks,
                    );
                    if !unmet.is_empty() {
                        let problems = unmet
                            .into_iter()
                            .map(|dep| format!("strong dependency '{dep}' is not completed"))
                            .collect();
                        return Err(RepoError::validation(format!("task '{id}'"), problems));
                    }
                }

                let resolved = percentage
                    .unwrap_or_else(|| self.config.progress.percentage_for(target));
                if resolved > 100 {
                    return Err(RepoError::validation(
                        format!("task '{id}'"),
                        vec![format!("progress percentage {resolved} exceeds 100")],
                    ));
                }

                let previous = collection.tasks[position].clone();
                let task = &mut collection.tasks[position];
                task.progress.history.push(ProgressEvent {
                    from,
                    to: target,
                    percentage: resolved,
                    at: now,
                });
                task.progress.state = target;
                task.progress.percentage = resolved;
                task.touch(now);
                let updated = task.clone();

                self.base.archive_record(&previous, now)?;
                self.base.store(&collection)?;
                self.base.notify(&RepoEvent::ProgressChanged {
                    id: updated.id.clone(),
                    from,
                    to: target,
                    percentage: resolved,
                });
                Ok(updated)
            })
    }

    /// Walk the dependency graph reachable from `id` and report every
    /// missing target, incomplete strong edge, and cycle.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] for an unknown id, storage faults otherwise.
    pub fn check_dependencies(&self, id: &str) -> Result<DependencyReport, RepoError> {
        self.base.guard("check_dependencies", Some(id), None, || {
            let collection = self.base.load()?;
            if !collection.tasks.iter().any(|task| task.id == id) {
                return Err(RepoError::not_found(Task::KIND, id));
            }
            Ok(DependencyGraph::new(&collection.tasks).check(id))
        })
    }

    // -----------------------------------------------------------------------
    // Hierarchy and focus
    // -----------------------------------------------------------------------

    /// Replace the hierarchy metadata stored alongside the tasks. Task
    /// records and the focus pointer are carried through untouched.
    ///
    /// # Errors
    ///
    /// [`RepoError::Validation`] when the hierarchy fails format checks,
    /// storage faults otherwise.
    pub fn update_task_hierarchy(&self, hierarchy: Hierarchy) -> Result<Hierarchy, RepoError> {
        self.base.guard("update_task_hierarchy", None, None, || {
            let report = validate::validate_hierarchy(&hierarchy);
            if !report.is_valid() {
                return Err(RepoError::validation(
                    "task hierarchy",
                    report.into_problems(),
                ));
            }
            let mut collection = self.base.load()?;
            collection.hierarchy = Some(hierarchy.clone());
            self.base.store(&collection)?;
            self.base.notify(&RepoEvent::HierarchyChanged);
            Ok(hierarchy)
        })
    }

    /// The stored hierarchy metadata, if any.
    ///
    /// # Errors
    ///
    /// Storage faults.
    pub fn task_hierarchy(&self) -> Result<Option<Hierarchy>, RepoError> {
        self.base.guard("task_hierarchy", None, None, || {
            Ok(self.base.load()?.hierarchy)
        })
    }

    /// Point the current focus at `Some(id)` or clear it with `None`.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] when pointing at a task that does not exist,
    /// storage faults otherwise.
    pub fn set_current_focus(&self, id: Option<&str>) -> Result<(), RepoError> {
        self.base.guard("set_current_focus", id, None, || {
            let mut collection = self.base.load()?;
            if let Some(id) = id {
                if !collection.tasks.iter().any(|task| task.id == id) {
                    return Err(RepoError::not_found(Task::KIND, id));
                }
                collection.current_focus = Some(id.to_string());
            } else {
                collection.current_focus = None;
            }
            self.base.store(&collection)?;
            self.base.notify(&RepoEvent::FocusChanged {
                id: collection.current_focus.clone(),
            });
            Ok(())
        })
    }

    /// The currently focused task, or `None` when no focus is set.
    ///
    /// # Errors
    ///
    /// Storage faults.
    pub fn current_focus(&self) -> Result<Option<Task>, RepoError> {
        self.base.guard("current_focus", None, None, || {
            let collection = self.base.load()?;
            let Some(focus_id) = &collection.current_focus else {
                return Ok(None);
            };
            let focused = collection
                .tasks
                .iter()
                .find(|task| &task.id == focus_id)
                .cloned();
            if focused.is_none() {
                // Deletes clear focus, but a crash between load and store
                // can leave a dangling pointer. Read it as no focus.
                warn!(focus = focus_id.as_str(), "current focus points at a missing task");
            }
            Ok(focused)
        })
    }

    // -----------------------------------------------------------------------
    // Commits
    // -----------------------------------------------------------------------

    /// Associate a commit ref with the task. Idempotent: an already-known
    /// ref returns the task unchanged without a write.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] for an unknown id, [`RepoError::Validation`]
    /// for an empty ref, storage faults otherwise.
    pub fn associate_commit(&self, id: &str, commit: &str) -> Result<Task, RepoError> {
        self.base.guard("associate_commit", Some(id), None, || {
            let commit = commit.trim();
            if commit.is_empty() {
                return Err(RepoError::validation(
                    format!("task '{id}'"),
                    vec!["commit ref must not be empty".to_string()],
                ));
            }

            let now = Utc::now();
            let mut collection = self.base.load()?;
            let Some(position) = collection.tasks.iter().position(|task| task.id == id) else {
                return Err(RepoError::not_found(Task::KIND, id));
            };

            if collection.tasks[position]
                .commits
                .iter()
                .any(|existing| existing == commit)
            {
                debug!(id, commit, "commit already associated");
                return Ok(collection.tasks[position].clone());
            }

            let previous = collection.tasks[position].clone();
            let task = &mut collection.tasks[position];
            task.commits.push(commit.to_string());
            task.touch(now);
            let updated = task.clone();

            self.base.archive_record(&previous, now)?;
            self.base.store(&collection)?;
            self.base.notify(&RepoEvent::CommitAssociated {
                id: updated.id.clone(),
                commit: commit.to_string(),
            });
            Ok(updated)
        })
    }
}

fn clear_stale_focus(collection: &mut TaskCollection, id: &str) -> bool {
    if collection.current_focus.as_deref() == Some(id) {
        collection.current_focus = None;
        true
    } else {
        false
    }
}

/// Direct strong dependencies of `task` that are missing or not completed.
fn incomplete_strong_dependencies(task: &Task, tasks: &[Task]) -> Vec<String> {
    task.dependencies
        .iter()
        .filter(|dep| dep.strength == DependencyStrength::Strong)
        .filter(|dep| {
            tasks
                .iter()
                .find(|candidate| candidate.id == dep.id)
                .is_none_or(|candidate| candidate.progress.state != ProgressState::Completed)
        })
        .map(|dep| dep.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::TaskRepository;
    use crate::config::ProjectConfig;
    use crate::error::RepoError;
    use crate::graph::DependencyIssue;
    use crate::model::hierarchy::{Hierarchy, Level};
    use crate::model::progress::ProgressState;
    use crate::model::task::{Dependency, Status, Task};
    use crate::store::FsStorage;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn repo() -> (TempDir, TaskRepository) {
        repo_with(ProjectConfig::default())
    }

    fn repo_with(config: ProjectConfig) -> (TempDir, TaskRepository) {
        let dir = TempDir::new().expect("tempdir");
        let repo = TaskRepository::new(Arc::new(FsStorage::new(dir.path())), config);
        (dir, repo)
    }

    fn advance(repo: &TaskRepository, id: &str, states: &[ProgressState]) {
        for state in states {
            repo.update_task_progress(id, *state, None).expect("progress");
        }
    }

    const LADDER: [ProgressState; 4] = [
        ProgressState::InDevelopment,
        ProgressState::DevComplete,
        ProgressState::InReview,
        ProgressState::Completed,
    ];

    #[test]
    fn progress_walks_the_ladder_with_default_percentages() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Ladder")).expect("create");

        let task = repo
            .update_task_progress("task-1", ProgressState::InDevelopment, None)
            .expect("first step");
        assert_eq!(task.progress.state, ProgressState::InDevelopment);
        assert_eq!(task.progress.percentage, 25);
        assert_eq!(task.status(), Status::InProgress);
        assert_eq!(task.progress.history.len(), 1);

        advance(&repo, "task-1", &LADDER[1..]);
        let done = repo.find_task("task-1").expect("find");
        assert_eq!(done.progress.state, ProgressState::Completed);
        assert_eq!(done.progress.percentage, 100);
        assert_eq!(done.status(), Status::Completed);
        assert_eq!(done.progress.history.len(), 4);
    }

    #[test]
    fn invalid_jump_names_both_states() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Jumpy")).expect("create");

        let err = repo
            .update_task_progress("task-1", ProgressState::Completed, None)
            .unwrap_err();
        let message = err.root().to_string();
        assert!(message.contains("not_started"), "message: {message}");
        assert!(message.contains("completed"), "message: {message}");

        let unchanged = repo.find_task("task-1").expect("find");
        assert_eq!(unchanged.progress.state, ProgressState::NotStarted);
        assert!(unchanged.progress.history.is_empty());
    }

    #[test]
    fn explicit_percentage_wins_over_defaults() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Custom")).expect("create");

        let task = repo
            .update_task_progress("task-1", ProgressState::InDevelopment, Some(40))
            .expect("progress");
        assert_eq!(task.progress.percentage, 40);

        let err = repo
            .update_task_progress("task-1", ProgressState::DevComplete, Some(120))
            .unwrap_err();
        assert!(matches!(err.root(), RepoError::Validation { .. }));
    }

    #[test]
    fn configured_percentage_overrides_built_in_ladder() {
        let mut config = ProjectConfig::default();
        config
            .progress
            .state_percentages
            .insert("in_development".to_string(), 10);
        let (_dir, repo) = repo_with(config);

        repo.create_task(Task::new("task-1", "Configured")).expect("create");
        let task = repo
            .update_task_progress("task-1", ProgressState::InDevelopment, None)
            .expect("progress");
        assert_eq!(task.progress.percentage, 10);
    }

    #[test]
    fn completion_blocked_by_incomplete_strong_dependency() {
        let (_dir, repo) = repo();
        let mut blocked = Task::new("task-1", "Blocked");
        blocked.dependencies = vec![Dependency::strong("task-2")];
        repo.create_task(blocked).expect("blocked");
        repo.create_task(Task::new("task-2", "Blocker")).expect("blocker");

        advance(&repo, "task-1", &LADDER[..3]);
        let err = repo
            .update_task_progress("task-1", ProgressState::Completed, None)
            .unwrap_err();
        let message = err.root().to_string();
        assert!(message.contains("task-2"), "message: {message}");

        // Complete the blocker, then the dependent completes fine.
        advance(&repo, "task-2", &LADDER);
        repo.update_task_progress("task-1", ProgressState::Completed, None)
            .expect("unblocked completion");
    }

    #[test]
    fn weak_dependencies_never_gate_completion() {
        let (_dir, repo) = repo();
        let mut task = Task::new("task-1", "Advisory");
        task.dependencies = vec![Dependency::weak("task-2")];
        repo.create_task(task).expect("create");
        repo.create_task(Task::new("task-2", "Not done")).expect("dep");

        advance(&repo, "task-1", &LADDER);
        let done = repo.find_task("task-1").expect("find");
        assert_eq!(done.progress.state, ProgressState::Completed);
    }

    #[test]
    fn missing_strong_dependency_blocks_completion() {
        let (_dir, repo) = repo();
        let mut task = Task::new("task-1", "Dangling");
        task.dependencies = vec![Dependency::strong("task-9")];
        repo.create_task(task).expect("create");

        advance(&repo, "task-1", &LADDER[..3]);
        let err = repo
            .update_task_progress("task-1", ProgressState::Completed, None)
            .unwrap_err();
        assert!(err.root().to_string().contains("task-9"));
    }

    #[test]
    fn reopen_follows_config() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Reopen me")).expect("create");
        advance(&repo, "task-1", &LADDER);
        repo.update_task_progress("task-1", ProgressState::InDevelopment, None)
            .expect("reopen allowed by default");

        let mut config = ProjectConfig::default();
        config.progress.allow_reopen = false;
        let (_dir2, strict) = repo_with(config);
        strict
            .create_task(Task::new("task-1", "Sealed"))
            .expect("create");
        advance(&strict, "task-1", &LADDER);
        let err = strict
            .update_task_progress("task-1", ProgressState::InDevelopment, None)
            .unwrap_err();
        assert!(err.root().to_string().contains("disabled"));
    }

    #[test]
    fn check_dependencies_reports_the_cycle_path() {
        let (_dir, repo) = repo();
        let mut first = Task::new("task-1", "First");
        first.dependencies = vec![Dependency::strong("task-2")];
        repo.create_task(first).expect("first");
        let mut second = Task::new("task-2", "Second");
        second.dependencies = vec![Dependency::strong("task-1")];
        repo.create_task(second).expect("second");

        let report = repo.check_dependencies("task-1").expect("check");
        let cycles: Vec<_> = report.cycles().collect();
        assert_eq!(cycles, vec![&["task-1", "task-2", "task-1"][..]]);
    }

    #[test]
    fn check_dependencies_requires_the_root_to_exist() {
        let (_dir, repo) = repo();
        let err = repo.check_dependencies("task-9").unwrap_err();
        assert!(matches!(err.root(), RepoError::NotFound { .. }));
    }

    #[test]
    fn check_dependencies_reports_missing_targets() {
        let (_dir, repo) = repo();
        let mut task = Task::new("task-1", "Dangling");
        task.dependencies = vec![Dependency::strong("task-9")];
        repo.create_task(task).expect("create");

        let report = repo.check_dependencies("task-1").expect("check");
        assert!(report.issues.iter().any(|issue| matches!(
            issue,
            DependencyIssue::Missing { to, .. } if to == "task-9"
        )));
    }

    #[test]
    fn forward_dependencies_are_allowed_at_create_time() {
        let (_dir, repo) = repo();
        let mut early = Task::new("task-1", "Early bird");
        early.dependencies = vec![Dependency::strong("task-2")];
        repo.create_task(early).expect("dependency target may not exist yet");
        repo.create_task(Task::new("task-2", "Late")).expect("target");

        let report = repo.check_dependencies("task-1").expect("check");
        assert!(!report.issues.iter().any(|issue| matches!(issue, DependencyIssue::Missing { .. })));
    }

    #[test]
    fn hierarchy_write_preserves_tasks_and_focus() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Parent")).expect("parent");
        repo.create_task(Task::new("task-2", "Child")).expect("child");
        repo.set_current_focus(Some("task-2")).expect("focus");

        let mut hierarchy = Hierarchy {
            levels: vec![Level::new("epic"), Level::new("task")],
            ..Hierarchy::default()
        };
        hierarchy
            .parents
            .insert("task-2".to_string(), "task-1".to_string());
        repo.update_task_hierarchy(hierarchy).expect("hierarchy");

        assert_eq!(repo.list_tasks().expect("tasks").len(), 2);
        let focus = repo.current_focus().expect("focus read");
        assert_eq!(focus.map(|task| task.id), Some("task-2".to_string()));
        let stored = repo.task_hierarchy().expect("read").expect("present");
        assert_eq!(stored.parent_of("task-2"), Some("task-1"));
    }

    #[test]
    fn invalid_hierarchy_is_rejected() {
        let (_dir, repo) = repo();
        let mut hierarchy = Hierarchy::default();
        hierarchy
            .parents
            .insert("task-1".to_string(), "task-1".to_string());

        let err = repo.update_task_hierarchy(hierarchy).unwrap_err();
        assert!(matches!(err.root(), RepoError::Validation { .. }));
        assert!(repo.task_hierarchy().expect("read").is_none());
    }

    #[test]
    fn focus_requires_an_existing_task() {
        let (_dir, repo) = repo();
        let err = repo.set_current_focus(Some("task-9")).unwrap_err();
        assert!(matches!(err.root(), RepoError::NotFound { .. }));
        assert!(repo.current_focus().expect("read").is_none());
    }

    #[test]
    fn focus_sets_clears_and_survives_other_writes() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Focused")).expect("create");
        repo.set_current_focus(Some("task-1")).expect("set");

        repo.create_task(Task::new("task-2", "Other")).expect("sibling write");
        let focus = repo.current_focus().expect("read").expect("still set");
        assert_eq!(focus.id, "task-1");

        repo.set_current_focus(None).expect("clear");
        assert!(repo.current_focus().expect("read").is_none());
    }

    #[test]
    fn deleting_the_focused_task_clears_focus() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Focused")).expect("create");
        repo.set_current_focus(Some("task-1")).expect("focus");

        repo.delete_task("task-1").expect("delete");
        assert!(repo.current_focus().expect("read").is_none());
    }

    #[test]
    fn bulk_delete_clears_focus_and_skips_missing() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "One")).expect("one");
        repo.create_task(Task::new("task-2", "Two")).expect("two");
        repo.set_current_focus(Some("task-2")).expect("focus");

        let removed = repo
            .delete_tasks(&["task-2".to_string(), "task-9".to_string()])
            .expect("bulk delete");
        assert_eq!(removed, 1);
        assert!(repo.current_focus().expect("read").is_none());
        assert_eq!(repo.list_tasks().expect("list").len(), 1);
    }

    #[test]
    fn associate_commit_is_idempotent() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Committed")).expect("create");

        let first = repo.associate_commit("task-1", "abc1234").expect("first");
        assert_eq!(first.commits, vec!["abc1234".to_string()]);
        assert_eq!(repo.history("task-1").expect("history").len(), 1);

        let second = repo.associate_commit("task-1", "abc1234").expect("second");
        assert_eq!(second.commits, vec!["abc1234".to_string()]);
        assert_eq!(
            repo.history("task-1").expect("history").len(),
            1,
            "repeat association must not write"
        );

        let third = repo.associate_commit("task-1", "def5678").expect("third");
        assert_eq!(third.commits.len(), 2);
    }

    #[test]
    fn empty_commit_ref_is_rejected() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Committed")).expect("create");

        let err = repo.associate_commit("task-1", "   ").unwrap_err();
        assert!(matches!(err.root(), RepoError::Validation { .. }));
    }

    #[test]
    fn progress_update_archives_the_previous_version() {
        let (_dir, repo) = repo();
        repo.create_task(Task::new("task-1", "Archived")).expect("create");
        repo.update_task_progress("task-1", ProgressState::InDevelopment, None)
            .expect("progress");

        let history = repo.history("task-1").expect("history");
        assert_eq!(history.len(), 1);
    }
}

//! Dependency graph checks.
//!
//! # Overview
//!
//! [`DependencyGraph`] borrows a task slice and walks the edges reachable
//! from one root, reporting missing targets, incomplete strong dependencies,
//! and cycles. One walk finds all three, so a caller gets the full picture
//! from a single pass.
//!
//! # Design
//!
//! The walk is an iterative depth-first search over an explicit frame stack,
//! with white/gray/black coloring. Gray marks the chain currently on the
//! stack; an edge into a gray node is a back edge and yields the concrete
//! cycle path. Recursion would overflow on deep dependency chains, which are
//! legal data here, so none is used.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::progress::ProgressState;
use crate::model::task::{DependencyStrength, Task};

/// One problem found while walking a task's dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DependencyIssue {
    /// An edge points at a task that does not exist in the collection.
    Missing { from: String, to: String },
    /// A strong dependency that has not reached the completed state.
    IncompleteStrong { from: String, to: String },
    /// A dependency cycle. The path starts and ends at the same id.
    Cycle { path: Vec<String> },
}

/// Everything wrong with the graph reachable from one root task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub issues: Vec<DependencyIssue>,
}

impl DependencyReport {
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.issues.is_empty()
    }

    /// The cycle paths in this report, if any.
    pub fn cycles(&self) -> impl Iterator<Item = &[String]> {
        self.issues.iter().filter_map(|issue| match issue {
            DependencyIssue::Cycle { path } => Some(path.as_slice()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Borrowed view of the dependency edges in one task collection.
pub struct DependencyGraph<'a> {
    tasks: HashMap<&'a str, &'a Task>,
}

impl<'a> DependencyGraph<'a> {
    #[must_use]
    pub fn new(tasks: &'a [Task]) -> Self {
        Self {
            tasks: tasks.iter().map(|task| (task.id.as_str(), task)).collect(),
        }
    }

    /// Walk everything reachable from `root` and report every issue found.
    ///
    /// An unknown root yields an empty report; whether that is an error is
    /// the caller's call, made before the walk.
    #[must_use]
    pub fn check(&self, root: &str) -> DependencyReport {
        let mut report = DependencyReport::default();
        let Some(&root_task) = self.tasks.get(root) else {
            return report;
        };

        let mut colors: HashMap<&str, Color> = HashMap::new();
        // Each frame is a task plus the index of the next edge to follow.
        // `path` mirrors the gray chain so a back edge can be sliced into a
        // concrete cycle.
        let mut stack: Vec<(&Task, usize)> = vec![(root_task, 0)];
        let mut path: Vec<&str> = vec![root_task.id.as_str()];
        colors.insert(root_task.id.as_str(), Color::Gray);

        while let Some(frame) = stack.last_mut() {
            let task = frame.0;
            let edge = frame.1;
            frame.1 += 1;

            let Some(dep) = task.dependencies.get(edge) else {
                colors.insert(task.id.as_str(), Color::Black);
                stack.pop();
                path.pop();
                continue;
            };

            let dep_id = dep.id.as_str();
            let Some(&dep_task) = self.tasks.get(dep_id) else {
                report.issues.push(DependencyIssue::Missing {
                    from: task.id.clone(),
                    to: dep.id.clone(),
                });
                continue;
            };

            if dep.strength == DependencyStrength::Strong
                && dep_task.progress.state != ProgressState::Completed
            {
                report.issues.push(DependencyIssue::IncompleteStrong {
                    from: task.id.clone(),
                    to: dep.id.clone(),
                });
            }

            match colors.get(dep_id).copied().unwrap_or(Color::White) {
                Color::White => {
                    colors.insert(dep_task.id.as_str(), Color::Gray);
                    stack.push((dep_task, 0));
                    path.push(dep_task.id.as_str());
                }
                Color::Gray => {
                    let start = path.iter().position(|id| *id == dep_id).unwrap_or(0);
                    let tail = path.get(start..).unwrap_or_default();
                    let mut cycle: Vec<String> = tail.iter().map(|id| (*id).to_string()).collect();
                    cycle.push(dep_id.to_string());
                    report.issues.push(DependencyIssue::Cycle { path: cycle });
                }
                Color::Black => {}
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::{DependencyGraph, DependencyIssue};
    use crate::model::progress::ProgressState;
    use crate::model::task::{Dependency, Task};

    fn task(id: &str, deps: &[&str]) -> Task {
        let mut task = Task::new(id, format!("Task {id}"));
        task.dependencies = deps.iter().map(|dep| Dependency::strong(*dep)).collect();
        task
    }

    fn completed(mut task: Task) -> Task {
        task.progress.state = ProgressState::Completed;
        task.progress.percentage = 100;
        task
    }

    #[test]
    fn chain_of_completed_dependencies_is_satisfied() {
        let tasks = vec![
            task("task-1", &["task-2"]),
            completed(task("task-2", &["task-3"])),
            completed(task("task-3", &[])),
        ];
        let report = DependencyGraph::new(&tasks).check("task-1");
        assert!(report.is_satisfied(), "issues: {:?}", report.issues);
    }

    #[test]
    fn missing_target_reported_with_both_ends() {
        let tasks = vec![task("task-1", &["task-9"])];
        let report = DependencyGraph::new(&tasks).check("task-1");
        assert_eq!(
            report.issues,
            vec![DependencyIssue::Missing {
                from: "task-1".to_string(),
                to: "task-9".to_string(),
            }]
        );
    }

    #[test]
    fn incomplete_strong_dependency_reported() {
        let tasks = vec![task("task-1", &["task-2"]), task("task-2", &[])];
        let report = DependencyGraph::new(&tasks).check("task-1");
        assert_eq!(
            report.issues,
            vec![DependencyIssue::IncompleteStrong {
                from: "task-1".to_string(),
                to: "task-2".to_string(),
            }]
        );
    }

    #[test]
    fn weak_dependencies_never_block() {
        let mut root = Task::new("task-1", "Root");
        root.dependencies = vec![Dependency::weak("task-2")];
        let tasks = vec![root, task("task-2", &[])];

        let report = DependencyGraph::new(&tasks).check("task-1");
        assert!(report.is_satisfied(), "issues: {:?}", report.issues);
    }

    #[test]
    fn two_node_cycle_path_starts_and_ends_at_same_id() {
        let tasks = vec![task("task-1", &["task-2"]), task("task-2", &["task-1"])];
        let report = DependencyGraph::new(&tasks).check("task-1");

        let cycles: Vec<_> = report.cycles().collect();
        assert_eq!(cycles, vec![&["task-1", "task-2", "task-1"][..]]);
    }

    #[test]
    fn self_loop_is_a_one_element_cycle() {
        let tasks = vec![task("task-1", &["task-1"])];
        let report = DependencyGraph::new(&tasks).check("task-1");

        let cycles: Vec<_> = report.cycles().collect();
        assert_eq!(cycles, vec![&["task-1", "task-1"][..]]);
    }

    #[test]
    fn cycle_found_past_completed_prefix() {
        let tasks = vec![
            task("task-1", &["task-2"]),
            completed(task("task-2", &["task-3"])),
            task("task-3", &["task-2"]),
        ];
        let report = DependencyGraph::new(&tasks).check("task-1");

        let cycles: Vec<_> = report.cycles().collect();
        assert_eq!(cycles, vec![&["task-2", "task-3", "task-2"][..]]);
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let tasks = vec![
            task("task-1", &["task-2", "task-3"]),
            completed(task("task-2", &["task-4"])),
            completed(task("task-3", &["task-4"])),
            completed(task("task-4", &[])),
        ];
        let report = DependencyGraph::new(&tasks).check("task-1");
        assert!(report.is_satisfied(), "issues: {:?}", report.issues);
    }

    #[test]
    fn unknown_root_yields_empty_report() {
        let tasks = vec![task("task-1", &[])];
        let report = DependencyGraph::new(&tasks).check("task-99");
        assert!(report.is_satisfied());
    }

    #[test]
    fn deep_chain_walks_without_recursion_limits() {
        // 10k-deep chains are legal data and must not rely on call depth.
        let mut tasks: Vec<Task> = (0..10_000)
            .map(|n| completed(task(&format!("task-{n}"), &[&format!("task-{}", n + 1)])))
            .collect();
        tasks.push(completed(task("task-10000", &[])));

        let report = DependencyGraph::new(&tasks).check("task-0");
        assert!(report.is_satisfied(), "issues: {:?}", report.issues);
    }
}

//! `dk list` — list tasks with filtering.

use anyhow::Result;
use clap::Args;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use docket_core::model::progress::ProgressState;
use docket_core::model::task::{Status, Task};

use crate::cmd::Project;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status: pending, in_progress, completed.
    #[arg(short, long)]
    pub status: Option<String>,

    /// Filter by progress state (e.g. in_review).
    #[arg(long)]
    pub state: Option<String>,

    /// Filter by tag. Repeatable; a task must carry every given tag.
    #[arg(short, long)]
    pub tag: Vec<String>,

    /// Maximum tasks to show.
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}

/// Execute `dk list`.
pub fn run_list(args: &ListArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    let wanted_status = match args.status.as_deref() {
        Some(raw) => match Status::from_str(raw) {
            Ok(status) => Some(status),
            Err(err) => {
                render_error(output, &CliError::new(err.to_string()))?;
                anyhow::bail!("{err}");
            }
        },
        None => None,
    };
    let wanted_state = match args.state.as_deref() {
        Some(raw) => match ProgressState::from_str(raw) {
            Ok(state) => Some(state),
            Err(err) => {
                render_error(output, &CliError::new(err.to_string()))?;
                anyhow::bail!("{err}");
            }
        },
        None => None,
    };

    let tags = args.tag.clone();
    let mut found = tasks
        .find_tasks_where(|task| {
            wanted_status.is_none_or(|status| task.status() == status)
                && wanted_state.is_none_or(|state| task.progress.state == state)
                && tags.iter().all(|tag| task.tags.contains(tag))
        })
        .map_err(|err| {
            render_error(output, &CliError::from(&err)).ok();
            err
        })?;
    found.truncate(args.limit);

    render(output, &found, |found, w| {
        if found.is_empty() {
            return writeln!(w, "no tasks");
        }
        for task in found {
            write_row(task, w)?;
        }
        Ok(())
    })
}

fn write_row(task: &Task, w: &mut dyn Write) -> std::io::Result<()> {
    let tags = if task.tags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", task.tags.join(", "))
    };
    writeln!(
        w,
        "{:<10} {:<12} {:>4}%  p{}  {}{}",
        task.id,
        task.progress.state,
        task.progress.percentage,
        task.priority,
        task.title,
        tags
    )
}

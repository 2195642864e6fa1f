//! `dk show` — show one task in full.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use docket_core::model::task::Task;
use docket_core::store::HistoryEntry;

use crate::cmd::Project;
use crate::output::{CliError, kv, render, render_error};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Task id, e.g. task-3.
    pub id: String,

    /// Also list archived versions of the task.
    #[arg(long)]
    pub history: bool,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<Vec<HistoryEntry>>,
}

/// Execute `dk show`.
pub fn run_show(args: &ShowArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    let task = match tasks.find_task(&args.id) {
        Ok(task) => task,
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            return Err(err.into());
        }
    };
    let history = if args.history {
        Some(tasks.history(&args.id).map_err(|err| {
            render_error(output, &CliError::from(&err)).ok();
            err
        })?)
    } else {
        None
    };

    render(output, &ShowOutput { task, history }, |out, w| {
        write_task(&out.task, w)?;
        if let Some(ref history) = out.history {
            writeln!(w)?;
            writeln!(w, "history ({} archived versions)", history.len())?;
            for entry in history {
                writeln!(
                    w,
                    "  {}  {}",
                    entry.archived_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.file_name
                )?;
            }
        }
        Ok(())
    })
}

fn write_task(task: &Task, w: &mut dyn Write) -> std::io::Result<()> {
    kv(w, "id", &task.id)?;
    kv(w, "title", &task.title)?;
    kv(w, "status", task.status().to_string())?;
    kv(
        w,
        "progress",
        format!("{} ({}%)", task.progress.state, task.progress.percentage),
    )?;
    kv(w, "priority", task.priority.to_string())?;
    if let Some(ref description) = task.description {
        kv(w, "description", description)?;
    }
    if let Some(hours) = task.estimated_hours {
        kv(w, "estimate", format!("{hours}h"))?;
    }
    if !task.tags.is_empty() {
        kv(w, "tags", task.tags.join(", "))?;
    }
    if !task.dependencies.is_empty() {
        let edges: Vec<String> = task
            .dependencies
            .iter()
            .map(|dep| format!("{} ({})", dep.id, dep.strength))
            .collect();
        kv(w, "depends on", edges.join(", "))?;
    }
    if !task.commits.is_empty() {
        kv(w, "commits", task.commits.join(", "))?;
    }
    kv(
        w,
        "created",
        task.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    )?;
    kv(
        w,
        "updated",
        task.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

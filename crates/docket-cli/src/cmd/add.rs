//! `dk add` — create a task.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use docket_core::model::task::{Dependency, DependencyStrength, Task};

use crate::cmd::{Project, next_id};
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task title.
    pub title: String,

    /// Longer description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Priority from 1 (highest) to 5 (lowest). Defaults from project config.
    #[arg(short, long)]
    pub priority: Option<u8>,

    /// Dependency on another task: '<id>' or '<id>:weak'. Repeatable.
    #[arg(long = "depends-on", value_name = "ID[:weak]")]
    pub depends_on: Vec<String>,

    /// Free-form tag. Repeatable.
    #[arg(short, long)]
    pub tag: Vec<String>,

    /// Estimated effort in hours.
    #[arg(long)]
    pub estimate: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AddOutput {
    ok: bool,
    id: String,
    title: String,
    priority: u8,
}

/// Parse '<id>' or '<id>:weak' into a dependency edge.
pub(crate) fn parse_dependency(raw: &str) -> Result<Dependency, String> {
    match raw.split_once(':') {
        None => Ok(Dependency::strong(raw)),
        Some((id, strength)) => {
            let strength =
                DependencyStrength::from_str(strength).map_err(|err| err.to_string())?;
            Ok(Dependency {
                id: id.to_string(),
                strength,
            })
        }
    }
}

/// Execute `dk add`.
pub fn run_add(args: &AddArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    let mut dependencies = Vec::new();
    for raw in &args.depends_on {
        match parse_dependency(raw) {
            Ok(dependency) => dependencies.push(dependency),
            Err(reason) => {
                let message = format!("invalid dependency '{raw}': {reason}");
                render_error(output, &CliError::new(&message))?;
                anyhow::bail!("{message}");
            }
        }
    }

    let existing = tasks.list_tasks().map_err(|err| {
        render_error(output, &CliError::from(&err)).ok();
        err
    })?;
    let id = next_id("task", existing.iter().map(|task| task.id.as_str()));

    let mut task = Task::new(id, args.title.clone());
    task.description = args.description.clone();
    task.priority = args
        .priority
        .unwrap_or(project.config.project.tasks.default_priority);
    task.dependencies = dependencies;
    task.tags = args.tag.clone();
    task.estimated_hours = args.estimate;

    match tasks.create_task(task) {
        Ok(created) => render(
            output,
            &AddOutput {
                ok: true,
                id: created.id.clone(),
                title: created.title.clone(),
                priority: created.priority,
            },
            |out, w| writeln!(w, "✓ created {} ({})", out.id, out.title),
        ),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}

//! `dk update` — patch task fields.
//!
//! Unset flags leave the stored value alone. List-valued flags (`--tag`,
//! `--depends-on`) replace the whole list when given; `--clear-tags` and
//! `--clear-deps` replace it with nothing.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use docket_core::model::task::TaskPatch;

use crate::cmd::Project;
use crate::cmd::add::parse_dependency;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Task id, e.g. task-3.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// New priority from 1 (highest) to 5 (lowest).
    #[arg(short, long)]
    pub priority: Option<u8>,

    /// Replace all dependencies: '<id>' or '<id>:weak'. Repeatable.
    #[arg(long = "depends-on", value_name = "ID[:weak]")]
    pub depends_on: Vec<String>,

    /// Remove every dependency.
    #[arg(long, conflicts_with = "depends_on")]
    pub clear_deps: bool,

    /// Replace all tags. Repeatable.
    #[arg(short, long)]
    pub tag: Vec<String>,

    /// Remove every tag.
    #[arg(long, conflicts_with = "tag")]
    pub clear_tags: bool,

    /// New estimated effort in hours.
    #[arg(long)]
    pub estimate: Option<f64>,
}

#[derive(Debug, Serialize)]
struct UpdateOutput {
    ok: bool,
    id: String,
    title: String,
}

/// Execute `dk update`.
pub fn run_update(args: &UpdateArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    let dependencies = if args.clear_deps {
        Some(Vec::new())
    } else if args.depends_on.is_empty() {
        None
    } else {
        let mut edges = Vec::new();
        for raw in &args.depends_on {
            match parse_dependency(raw) {
                Ok(dependency) => edges.push(dependency),
                Err(reason) => {
                    let message = format!("invalid dependency '{raw}': {reason}");
                    render_error(output, &CliError::new(&message))?;
                    anyhow::bail!("{message}");
                }
            }
        }
        Some(edges)
    };
    let tags = if args.clear_tags {
        Some(Vec::new())
    } else if args.tag.is_empty() {
        None
    } else {
        Some(args.tag.clone())
    };

    let patch = TaskPatch {
        title: args.title.clone(),
        description: args.description.clone(),
        priority: args.priority,
        dependencies,
        estimated_hours: args.estimate,
        tags,
    };
    if patch == TaskPatch::default() {
        let message = "nothing to update: pass at least one field flag";
        render_error(output, &CliError::new(message))?;
        anyhow::bail!("{message}");
    }

    match tasks.update_task(&args.id, patch) {
        Ok(updated) => render(
            output,
            &UpdateOutput {
                ok: true,
                id: updated.id.clone(),
                title: updated.title.clone(),
            },
            |out, w| writeln!(w, "✓ updated {} ({})", out.id, out.title),
        ),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}

//! `dk commit` — associate a commit ref with a task.
//!
//! Repeating the same ref is a no-op; the task keeps one copy.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::cmd::Project;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Task id to attach the commit to.
    pub id: String,

    /// Commit ref (hash, tag, or any identifier your workflow uses).
    pub commit: String,
}

#[derive(Debug, Serialize)]
struct CommitOutput {
    ok: bool,
    id: String,
    commits: Vec<String>,
}

/// Execute `dk commit`.
pub fn run_commit(args: &CommitArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    match tasks.associate_commit(&args.id, &args.commit) {
        Ok(task) => render(
            output,
            &CommitOutput {
                ok: true,
                id: task.id.clone(),
                commits: task.commits.clone(),
            },
            |out, w| {
                writeln!(
                    w,
                    "✓ {} now tracks {} commit(s)",
                    out.id,
                    out.commits.len()
                )
            },
        ),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}

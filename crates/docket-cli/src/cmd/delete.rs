//! `dk delete` — remove one or more tasks.
//!
//! Every removed version stays readable through `dk history`. With several
//! ids, unknown ones are skipped and the count reflects what was removed.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::cmd::Project;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Task ids to delete.
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    ok: bool,
    removed: usize,
}

/// Execute `dk delete`.
pub fn run_delete(args: &DeleteArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    // A single id keeps strict not-found semantics; a batch skips unknowns.
    let removed = if let [id] = args.ids.as_slice() {
        match tasks.delete_task(id) {
            Ok(()) => 1,
            Err(err) => {
                render_error(output, &CliError::from(&err))?;
                anyhow::bail!("{err}");
            }
        }
    } else {
        match tasks.delete_tasks(&args.ids) {
            Ok(removed) => removed,
            Err(err) => {
                render_error(output, &CliError::from(&err))?;
                anyhow::bail!("{err}");
            }
        }
    };

    render(
        output,
        &DeleteOutput { ok: true, removed },
        |out, w| writeln!(w, "✓ deleted {} task(s)", out.removed),
    )
}

//! `dk progress` — move a task through its lifecycle.
//!
//! Valid transitions walk the ladder (`not_started -> in_development ->
//! dev_complete -> in_review -> completed`), with rework back to
//! `in_development` and config-gated reopening of completed tasks.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use docket_core::model::progress::ProgressState;

use crate::cmd::Project;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct ProgressArgs {
    /// Task id, e.g. task-3.
    pub id: String,

    /// Target state: in_development, dev_complete, in_review, completed.
    pub state: String,

    /// Completion percentage to record (defaults per state, configurable).
    #[arg(long)]
    pub percent: Option<u8>,
}

#[derive(Debug, Serialize)]
struct ProgressOutput {
    ok: bool,
    id: String,
    state: ProgressState,
    percentage: u8,
}

/// Execute `dk progress`.
pub fn run_progress(args: &ProgressArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    let target = match ProgressState::from_str(&args.state) {
        Ok(state) => state,
        Err(err) => {
            render_error(
                output,
                &CliError::with_details(
                    err.to_string(),
                    "States: not_started, in_development, dev_complete, in_review, completed",
                    "validation",
                ),
            )?;
            anyhow::bail!("{err}");
        }
    };

    match tasks.update_task_progress(&args.id, target, args.percent) {
        Ok(updated) => render(
            output,
            &ProgressOutput {
                ok: true,
                id: updated.id.clone(),
                state: updated.progress.state,
                percentage: updated.progress.percentage,
            },
            |out, w| {
                writeln!(w, "✓ {} -> {} ({}%)", out.id, out.state, out.percentage)
            },
        ),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}

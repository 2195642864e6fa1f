//! `dk history` — list the archived versions of a task.
//!
//! Archives survive deletion, so this also works for ids that no longer
//! appear in `dk list`.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use docket_core::store::HistoryEntry;

use crate::cmd::Project;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Task id whose archive to list.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct HistoryOutput {
    ok: bool,
    id: String,
    entries: Vec<HistoryEntry>,
}

/// Execute `dk history`.
pub fn run_history(args: &HistoryArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    match tasks.history(&args.id) {
        Ok(entries) => render(
            output,
            &HistoryOutput {
                ok: true,
                id: args.id.clone(),
                entries,
            },
            |out, w| {
                if out.entries.is_empty() {
                    return writeln!(w, "no history for {}", out.id);
                }
                writeln!(w, "{}: {} archived version(s)", out.id, out.entries.len())?;
                for entry in &out.entries {
                    writeln!(
                        w,
                        "  {}  {}",
                        entry.archived_at.format("%Y-%m-%d %H:%M:%S"),
                        entry.file_name
                    )?;
                }
                Ok(())
            },
        ),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}

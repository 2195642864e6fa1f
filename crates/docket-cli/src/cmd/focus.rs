//! `dk focus` — show, set, or clear the current focus task.
//!
//! With an id the focus moves there; with `--clear` it is dropped; with
//! neither the current focus task is printed.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::cmd::Project;
use crate::output::{CliError, render, render_error, render_success};

#[derive(Args, Debug)]
pub struct FocusArgs {
    /// Task id to focus on. Omit to show the current focus.
    pub id: Option<String>,

    /// Clear the current focus.
    #[arg(long, conflicts_with = "id")]
    pub clear: bool,
}

#[derive(Debug, Serialize)]
struct FocusOutput {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

/// Execute `dk focus`.
pub fn run_focus(args: &FocusArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    if args.clear {
        return match tasks.set_current_focus(None) {
            Ok(()) => render_success(output, "focus cleared"),
            Err(err) => {
                render_error(output, &CliError::from(&err))?;
                Err(err.into())
            }
        };
    }

    if let Some(id) = &args.id {
        return match tasks.set_current_focus(Some(id.as_str())) {
            Ok(()) => render_success(output, &format!("focus set to {id}")),
            Err(err) => {
                render_error(output, &CliError::from(&err))?;
                Err(err.into())
            }
        };
    }

    match tasks.current_focus() {
        Ok(focus) => render(
            output,
            &FocusOutput {
                ok: true,
                focus: focus.as_ref().map(|task| task.id.clone()),
                title: focus.as_ref().map(|task| task.title.clone()),
            },
            |out, w| match (&out.focus, &out.title) {
                (Some(id), Some(title)) => writeln!(w, "focus: {id} ({title})"),
                _ => writeln!(w, "no current focus"),
            },
        ),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}

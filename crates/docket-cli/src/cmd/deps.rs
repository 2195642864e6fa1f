//! `dk deps` — check a task's dependency graph.
//!
//! Walks everything reachable from the given task and reports missing
//! targets, incomplete strong dependencies, and cycles in one pass.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use docket_core::graph::{DependencyIssue, DependencyReport};

use crate::cmd::Project;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Task id whose graph to check.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct DepsOutput {
    ok: bool,
    id: String,
    satisfied: bool,
    #[serde(flatten)]
    report: DependencyReport,
}

/// Execute `dk deps`.
pub fn run_deps(args: &DepsArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    match tasks.check_dependencies(&args.id) {
        Ok(report) => render(
            output,
            &DepsOutput {
                ok: true,
                id: args.id.clone(),
                satisfied: report.is_satisfied(),
                report,
            },
            write_report,
        ),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}

fn write_report(out: &DepsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.satisfied {
        return writeln!(w, "✓ {}: all dependencies satisfied", out.id);
    }

    writeln!(
        w,
        "{}: {} problem(s) found",
        out.id,
        out.report.issues.len()
    )?;
    for issue in &out.report.issues {
        match issue {
            DependencyIssue::Missing { from, to } => {
                writeln!(w, "  missing:    {from} -> {to} (no such task)")?;
            }
            DependencyIssue::IncompleteStrong { from, to } => {
                writeln!(w, "  incomplete: {from} -> {to}")?;
            }
            DependencyIssue::Cycle { path } => {
                writeln!(w, "  cycle:      {}", path.join(" -> "))?;
            }
        }
    }
    Ok(())
}

//! `dk hierarchy` — show or replace the task grouping metadata.
//!
//! A hierarchy is a list of level names (broadest first) plus child-to-parent
//! edges. `set` replaces the whole document; there is no partial edit.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use docket_core::model::hierarchy::{Hierarchy, Level};

use crate::cmd::Project;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct HierarchyArgs {
    #[command(subcommand)]
    pub command: HierarchyCommand,
}

#[derive(Subcommand, Debug)]
pub enum HierarchyCommand {
    /// Print the current hierarchy.
    Show,

    /// Replace the hierarchy with the given levels and parent edges.
    Set {
        /// Comma-separated level names, broadest first (e.g. epic,story,task).
        #[arg(long, value_delimiter = ',', required = true)]
        levels: Vec<String>,

        /// Parent edge as CHILD=PARENT. Repeatable.
        #[arg(long = "parent", value_name = "CHILD=PARENT")]
        parents: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
struct HierarchyOutput {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    hierarchy: Option<Hierarchy>,
}

/// Execute `dk hierarchy`.
pub fn run_hierarchy(args: &HierarchyArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let tasks = project.tasks();

    match &args.command {
        HierarchyCommand::Show => match tasks.task_hierarchy() {
            Ok(hierarchy) => render(
                output,
                &HierarchyOutput {
                    ok: true,
                    hierarchy,
                },
                write_hierarchy,
            ),
            Err(err) => {
                render_error(output, &CliError::from(&err))?;
                Err(err.into())
            }
        },
        HierarchyCommand::Set { levels, parents } => {
            let mut hierarchy = Hierarchy {
                levels: levels.iter().map(|name| Level::new(name.as_str())).collect(),
                ..Hierarchy::default()
            };
            for pair in parents {
                let Some((child, parent)) = pair.split_once('=') else {
                    render_error(
                        output,
                        &CliError::with_details(
                            format!("invalid parent edge '{pair}'"),
                            "Write edges as CHILD=PARENT, e.g. --parent task-2=task-1",
                            "validation",
                        ),
                    )?;
                    anyhow::bail!("invalid parent edge '{pair}'");
                };
                hierarchy
                    .parents
                    .insert(child.to_string(), parent.to_string());
            }

            match tasks.update_task_hierarchy(hierarchy) {
                Ok(stored) => render(
                    output,
                    &HierarchyOutput {
                        ok: true,
                        hierarchy: Some(stored),
                    },
                    write_hierarchy,
                ),
                Err(err) => {
                    render_error(output, &CliError::from(&err))?;
                    Err(err.into())
                }
            }
        }
    }
}

fn write_hierarchy(out: &HierarchyOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let Some(hierarchy) = &out.hierarchy else {
        return writeln!(w, "no hierarchy configured");
    };

    let names: Vec<&str> = hierarchy
        .levels
        .iter()
        .map(|level| level.name.as_str())
        .collect();
    writeln!(w, "levels: {}", names.join(" > "))?;
    if hierarchy.parents.is_empty() {
        writeln!(w, "parents: none")?;
    } else {
        writeln!(w, "parents:")?;
        for (child, parent) in &hierarchy.parents {
            writeln!(w, "  {child} -> {parent}")?;
        }
    }
    Ok(())
}

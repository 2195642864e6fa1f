//! `dk feedback` — record and list feedback items.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use docket_core::model::feedback::Feedback;

use crate::cmd::{self, Project};
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    #[command(subcommand)]
    pub command: FeedbackCommand,
}

#[derive(Subcommand, Debug)]
pub enum FeedbackCommand {
    /// Record a feedback item.
    Add {
        /// Feedback text.
        body: String,

        /// Task this feedback is about.
        #[arg(long)]
        task: Option<String>,

        /// Rating from 1 (worst) to 5 (best).
        #[arg(long)]
        rating: Option<u8>,
    },

    /// List all feedback items.
    List,
}

#[derive(Debug, Serialize)]
struct AddOutput {
    ok: bool,
    id: String,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    ok: bool,
    items: Vec<Feedback>,
}

/// Execute `dk feedback`.
pub fn run_feedback(args: &FeedbackArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let feedback = project.feedback();

    match &args.command {
        FeedbackCommand::Add { body, task, rating } => {
            if let Some(task_id) = task {
                if let Err(err) = project.tasks().find_task(task_id) {
                    render_error(output, &CliError::from(&err))?;
                    return Err(err.into());
                }
            }

            let existing = match feedback.find_all() {
                Ok(existing) => existing,
                Err(err) => {
                    render_error(output, &CliError::from(&err))?;
                    return Err(err.into());
                }
            };
            let id = cmd::next_id("fb", existing.iter().map(|item| item.id.as_str()));

            let mut item = Feedback::new(id, body.clone());
            item.task_id = task.clone();
            item.rating = *rating;

            match feedback.create(item) {
                Ok(created) => render(
                    output,
                    &AddOutput {
                        ok: true,
                        id: created.id.clone(),
                    },
                    |out, w| writeln!(w, "✓ recorded {}", out.id),
                ),
                Err(err) => {
                    render_error(output, &CliError::from(&err))?;
                    Err(err.into())
                }
            }
        }
        FeedbackCommand::List => match feedback.find_all() {
            Ok(all) => render(
                output,
                &ListOutput {
                    ok: true,
                    items: all,
                },
                write_items,
            ),
            Err(err) => {
                render_error(output, &CliError::from(&err))?;
                Err(err.into())
            }
        },
    }
}

fn write_items(out: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.items.is_empty() {
        return writeln!(w, "no feedback");
    }
    for item in &out.items {
        let rating = item
            .rating
            .map(|rating| format!("  {rating}/5"))
            .unwrap_or_default();
        let task = item
            .task_id
            .as_deref()
            .map(|task| format!("  task {task}"))
            .unwrap_or_default();
        writeln!(w, "{:<8}{rating}{task}  {}", item.id, item.body)?;
    }
    Ok(())
}

//! `dk session` — record working sessions.
//!
//! Sessions are append-mostly: start one (optionally against a task), add
//! notes while it runs, end it when done. Ended sessions stay listed.

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use docket_core::model::session::{Session, SessionPatch};

use crate::cmd::{self, Project};
use crate::output::{CliError, render, render_error, render_success};

#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Start a new session.
    Start {
        /// Task this session works on.
        #[arg(long)]
        task: Option<String>,
    },

    /// End a running session.
    End {
        /// Session id, e.g. sess-2.
        id: String,
    },

    /// Append a note to a session.
    Note {
        /// Session id.
        id: String,

        /// Note text.
        note: String,
    },

    /// List all sessions.
    List,
}

#[derive(Debug, Serialize)]
struct StartOutput {
    ok: bool,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    ok: bool,
    sessions: Vec<Session>,
}

/// Execute `dk session`.
pub fn run_session(args: &SessionArgs, json: bool, project_root: &Path) -> Result<()> {
    let project = Project::discover(project_root, json)?;
    let output = project.output();
    let sessions = project.sessions();

    match &args.command {
        SessionCommand::Start { task } => {
            if let Some(task_id) = task {
                // Fail early on a typo'd task id instead of storing a
                // dangling reference.
                if let Err(err) = project.tasks().find_task(task_id) {
                    render_error(output, &CliError::from(&err))?;
                    return Err(err.into());
                }
            }

            let existing = match sessions.find_all() {
                Ok(existing) => existing,
                Err(err) => {
                    render_error(output, &CliError::from(&err))?;
                    return Err(err.into());
                }
            };
            let id = cmd::next_id("sess", existing.iter().map(|session| session.id.as_str()));

            let mut session = Session::new(id, Utc::now());
            session.task_id = task.clone();

            match sessions.create(session) {
                Ok(created) => render(
                    output,
                    &StartOutput {
                        ok: true,
                        id: created.id.clone(),
                        task: created.task_id.clone(),
                    },
                    |out, w| match &out.task {
                        Some(task) => writeln!(w, "✓ started {} (task {task})", out.id),
                        None => writeln!(w, "✓ started {}", out.id),
                    },
                ),
                Err(err) => {
                    render_error(output, &CliError::from(&err))?;
                    Err(err.into())
                }
            }
        }
        SessionCommand::End { id } => {
            let patch = SessionPatch {
                ended_at: Some(Utc::now()),
                ..SessionPatch::default()
            };
            match sessions.update(id, patch) {
                Ok(_) => render_success(output, &format!("ended {id}")),
                Err(err) => {
                    render_error(output, &CliError::from(&err))?;
                    Err(err.into())
                }
            }
        }
        SessionCommand::Note { id, note } => {
            // Notes patch wholesale, so read the current list and extend it.
            let session = match sessions.find_by_id(id) {
                Ok(session) => session,
                Err(err) => {
                    render_error(output, &CliError::from(&err))?;
                    return Err(err.into());
                }
            };
            let mut notes = session.notes;
            notes.push(note.clone());

            let patch = SessionPatch {
                notes: Some(notes),
                ..SessionPatch::default()
            };
            match sessions.update(id, patch) {
                Ok(updated) => render_success(
                    output,
                    &format!("noted {} ({} note(s))", updated.id, updated.notes.len()),
                ),
                Err(err) => {
                    render_error(output, &CliError::from(&err))?;
                    Err(err.into())
                }
            }
        }
        SessionCommand::List => match sessions.find_all() {
            Ok(all) => render(
                output,
                &ListOutput {
                    ok: true,
                    sessions: all,
                },
                write_sessions,
            ),
            Err(err) => {
                render_error(output, &CliError::from(&err))?;
                Err(err.into())
            }
        },
    }
}

fn write_sessions(out: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.sessions.is_empty() {
        return writeln!(w, "no sessions");
    }
    for session in &out.sessions {
        let status = session.ended_at.map_or_else(
            || "open".to_string(),
            |ended| format!("ended {}", ended.format("%H:%M")),
        );
        let task = session
            .task_id
            .as_deref()
            .map(|task| format!("  task {task}"))
            .unwrap_or_default();
        writeln!(
            w,
            "{:<10} started {}  {status}{task}  {} note(s)",
            session.id,
            session.started_at.format("%Y-%m-%d %H:%M"),
            session.notes.len()
        )?;
    }
    Ok(())
}

#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "docket: file-backed task tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a docket project",
        long_about = "Initialize a docket project in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    dk init\n\n    # Reinitialize, overwriting the config\n    dk init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Create a new task",
        long_about = "Create a new task with an auto-assigned id.",
        after_help = "EXAMPLES:\n    # Create a task\n    dk add \"Fix login timeout\"\n\n    # With priority, tags, and a dependency\n    dk add \"Ship v2\" -p 1 -t release --depends-on task-3\n\n    # Emit machine-readable output\n    dk add \"Fix login timeout\" --json"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Update fields on a task",
        long_about = "Apply a partial update to a task. Omitted fields are untouched; list flags replace the whole list.",
        after_help = "EXAMPLES:\n    # Retitle and bump priority\n    dk update task-3 --title \"Fix login timeout (again)\" -p 1\n\n    # Replace the dependency list\n    dk update task-3 --depends-on task-1 --depends-on task-2:weak\n\n    # Drop all tags\n    dk update task-3 --clear-tags"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Move a task through its lifecycle",
        long_about = "Move a task to a new progress state, recording the transition.",
        after_help = "EXAMPLES:\n    # Start work\n    dk progress task-3 in_development\n\n    # Complete with an explicit percentage kept for the record\n    dk progress task-3 completed --percent 100\n\n    # Emit machine-readable output\n    dk progress task-3 in_review --json"
    )]
    Progress(cmd::progress::ProgressArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Delete tasks",
        long_about = "Delete one or more tasks. Archived versions stay readable via history.",
        after_help = "EXAMPLES:\n    # Delete one task\n    dk delete task-3\n\n    # Delete several; unknown ids are skipped\n    dk delete task-3 task-4 task-9"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Read",
        about = "List tasks",
        long_about = "List tasks with optional status, state, and tag filters.",
        after_help = "EXAMPLES:\n    # List everything\n    dk list\n\n    # Only active backend work\n    dk list -s active -t backend\n\n    # Emit machine-readable output\n    dk list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one task",
        long_about = "Show full details for a single task by id.",
        after_help = "EXAMPLES:\n    # Show a task\n    dk show task-3\n\n    # Include its archive listing\n    dk show task-3 --history\n\n    # Emit machine-readable output\n    dk show task-3 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Check a task's dependencies",
        long_about = "Walk a task's dependency graph and report missing targets, incomplete strong dependencies, and cycles.",
        after_help = "EXAMPLES:\n    # Check before completing\n    dk deps task-3\n\n    # Emit machine-readable output\n    dk deps task-3 --json"
    )]
    Deps(cmd::deps::DepsArgs),

    #[command(
        next_help_heading = "Read",
        about = "List archived versions of a task",
        long_about = "List the archived versions of a task, newest first. Works for deleted ids too.",
        after_help = "EXAMPLES:\n    # See what changed\n    dk history task-3\n\n    # Emit machine-readable output\n    dk history task-3 --json"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Metadata",
        about = "Show, set, or clear the focus task",
        long_about = "Show, set, or clear the single task currently in focus.",
        after_help = "EXAMPLES:\n    # What am I working on?\n    dk focus\n\n    # Switch focus\n    dk focus task-3\n\n    # Drop it\n    dk focus --clear"
    )]
    Focus(cmd::focus::FocusArgs),

    #[command(
        next_help_heading = "Metadata",
        about = "Associate a commit with a task",
        long_about = "Record a commit ref against a task. Repeats are ignored.",
        after_help = "EXAMPLES:\n    # Link the commit you just made\n    dk commit task-3 4f2c91a\n\n    # Emit machine-readable output\n    dk commit task-3 4f2c91a --json"
    )]
    Commit(cmd::commit::CommitArgs),

    #[command(
        next_help_heading = "Metadata",
        about = "Show or replace the task hierarchy",
        long_about = "Show or replace the level names and parent edges that group tasks.",
        after_help = "EXAMPLES:\n    # Show the current hierarchy\n    dk hierarchy show\n\n    # Replace it\n    dk hierarchy set --levels epic,story,task --parent task-2=task-1"
    )]
    Hierarchy(cmd::hierarchy::HierarchyArgs),

    #[command(
        next_help_heading = "Records",
        about = "Record working sessions",
        long_about = "Start, end, annotate, and list working sessions.",
        after_help = "EXAMPLES:\n    # Start a session against a task\n    dk session start --task task-3\n\n    # Add a note while it runs\n    dk session note sess-1 \"found the root cause\"\n\n    # End it\n    dk session end sess-1"
    )]
    Session(cmd::session::SessionArgs),

    #[command(
        next_help_heading = "Records",
        about = "Record and list feedback",
        long_about = "Record feedback items, optionally rated and tied to a task.",
        after_help = "EXAMPLES:\n    # Record plain feedback\n    dk feedback add \"review notes were helpful\"\n\n    # Rated and tied to a task\n    dk feedback add \"flaky test slowed me down\" --task task-3 --rating 2"
    )]
    Feedback(cmd::feedback::FeedbackArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    dk completions bash\n\n    # Generate zsh completions\n    dk completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DOCKET_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "docket=debug,info"
        } else {
            "docket=info,warn"
        })
    });

    let format = env::var("DOCKET_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = std::env::current_dir()?;

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, cli.json, &project_root),
        Commands::Add(ref args) => cmd::add::run_add(args, cli.json, &project_root),
        Commands::Update(ref args) => cmd::update::run_update(args, cli.json, &project_root),
        Commands::Progress(ref args) => cmd::progress::run_progress(args, cli.json, &project_root),
        Commands::Delete(ref args) => cmd::delete::run_delete(args, cli.json, &project_root),
        Commands::List(ref args) => cmd::list::run_list(args, cli.json, &project_root),
        Commands::Show(ref args) => cmd::show::run_show(args, cli.json, &project_root),
        Commands::Deps(ref args) => cmd::deps::run_deps(args, cli.json, &project_root),
        Commands::History(ref args) => cmd::history::run_history(args, cli.json, &project_root),
        Commands::Focus(ref args) => cmd::focus::run_focus(args, cli.json, &project_root),
        Commands::Commit(ref args) => cmd::commit::run_commit(args, cli.json, &project_root),
        Commands::Hierarchy(ref args) => {
            cmd::hierarchy::run_hierarchy(args, cli.json, &project_root)
        }
        Commands::Session(ref args) => cmd::session::run_session(args, cli.json, &project_root),
        Commands::Feedback(ref args) => cmd::feedback::run_feedback(args, cli.json, &project_root),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["dk", "--json", "list"]);
        assert!(cli.json);
    }

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["dk", "list", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn default_output_is_human() {
        let cli = Cli::parse_from(["dk", "list"]);
        assert!(!cli.json);
    }

    #[test]
    fn quiet_flag_parsed() {
        let cli = Cli::parse_from(["dk", "-q", "list"]);
        assert!(cli.quiet);
    }

    #[test]
    fn add_subcommand_parses() {
        let cli = Cli::parse_from(["dk", "add", "My task", "-p", "2", "-t", "backend"]);
        assert!(matches!(cli.command, Commands::Add(_)));
    }

    #[test]
    fn progress_subcommand_parses() {
        let cli = Cli::parse_from(["dk", "progress", "task-1", "completed", "--percent", "100"]);
        assert!(matches!(cli.command, Commands::Progress(_)));
    }

    #[test]
    fn update_list_flags_conflict_with_clear_flags() {
        let result = Cli::try_parse_from([
            "dk",
            "update",
            "task-1",
            "--depends-on",
            "task-2",
            "--clear-deps",
        ]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["dk", "update", "task-1", "-t", "x", "--clear-tags"]);
        assert!(result.is_err());
    }

    #[test]
    fn focus_id_conflicts_with_clear() {
        let result = Cli::try_parse_from(["dk", "focus", "task-1", "--clear"]);
        assert!(result.is_err());
    }

    #[test]
    fn delete_requires_at_least_one_id() {
        let result = Cli::try_parse_from(["dk", "delete"]);
        assert!(result.is_err());
    }

    #[test]
    fn hierarchy_set_parses_levels_and_parents() {
        let cli = Cli::parse_from([
            "dk",
            "hierarchy",
            "set",
            "--levels",
            "epic,story,task",
            "--parent",
            "task-2=task-1",
        ]);
        assert!(matches!(cli.command, Commands::Hierarchy(_)));
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["dk", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        // Verify every subcommand exists by parsing each once.
        let subcommands = [
            vec!["dk", "init"],
            vec!["dk", "add", "x"],
            vec!["dk", "update", "x", "--title", "y"],
            vec!["dk", "progress", "x", "completed"],
            vec!["dk", "delete", "x"],
            vec!["dk", "list"],
            vec!["dk", "show", "x"],
            vec!["dk", "deps", "x"],
            vec!["dk", "history", "x"],
            vec!["dk", "focus"],
            vec!["dk", "commit", "x", "abc123"],
            vec!["dk", "hierarchy", "show"],
            vec!["dk", "session", "list"],
            vec!["dk", "feedback", "list"],
            vec!["dk", "completions", "bash"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(
                result.is_ok(),
                "Failed to parse: {:?} — error: {:?}",
                args,
                result.err()
            );
        }
    }
}

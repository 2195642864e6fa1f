//! `dk init` — initialize a docket project.

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::Path;

use crate::output::{OutputMode, render_success};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force re-initialization even if `.docket/` already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[progress]\n\
    allow_reopen = true\n\
    \n\
    # Per-state completion percentage overrides.\n\
    # [progress.state_percentages]\n\
    # in_review = 80\n\
    \n\
    [tasks]\n\
    default_priority = 3\n";

/// Execute `dk init`. Creates the project skeleton:
///
/// ```text
/// .docket/
///   config.toml    (default project config template)
/// ```
///
/// The per-kind data directories (`tasks/`, `sessions/`, `feedback-items/`)
/// are created lazily on first write.
///
/// # Errors
///
/// Returns an error if `.docket/` already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, json: bool, project_root: &Path) -> Result<()> {
    let docket_dir = project_root.join(".docket");

    if docket_dir.exists() && !args.force {
        anyhow::bail!(".docket/ already exists. Use 'dk init --force' to reinitialize.");
    }

    std::fs::create_dir_all(&docket_dir)
        .with_context(|| format!("Failed to create {}", docket_dir.display()))?;

    let config_path = docket_dir.join("config.toml");
    std::fs::write(&config_path, CONFIG_TOML)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let output = if json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    render_success(output, "initialized docket project in .docket/")
}

#[cfg(test)]
mod tests {
    use super::{InitArgs, run_init};
    use tempfile::TempDir;

    #[test]
    fn init_writes_a_parseable_config() {
        let dir = TempDir::new().expect("tempdir");
        run_init(&InitArgs { force: false }, false, dir.path()).expect("init");

        let config =
            docket_core::config::load_project_config(dir.path()).expect("config parses");
        assert!(config.progress.allow_reopen);
        assert_eq!(config.tasks.default_priority, 3);
    }

    #[test]
    fn second_init_requires_force() {
        let dir = TempDir::new().expect("tempdir");
        run_init(&InitArgs { force: false }, false, dir.path()).expect("first");
        assert!(run_init(&InitArgs { force: false }, false, dir.path()).is_err());
        run_init(&InitArgs { force: true }, false, dir.path()).expect("forced");
    }
}

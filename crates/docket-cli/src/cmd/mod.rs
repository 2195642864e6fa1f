//! Command implementations.
//!
//! Every command resolves a [`Project`] first: the nearest ancestor
//! directory containing `.docket/`, the layered config, and repository
//! handles over the data tree inside `.docket/`.

pub mod add;
pub mod commit;
pub mod completions;
pub mod delete;
pub mod deps;
pub mod feedback;
pub mod focus;
pub mod hierarchy;
pub mod history;
pub mod init;
pub mod list;
pub mod progress;
pub mod session;
pub mod show;
pub mod update;

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docket_core::config::{self, EffectiveConfig};
use docket_core::events::LogBus;
use docket_core::store::Storage;
use docket_core::{FeedbackRepository, FsStorage, SessionRepository, TaskRepository};

use crate::output::OutputMode;

/// A discovered docket project: root directory, resolved config, and the
/// storage handle shared by every repository the command opens.
pub struct Project {
    pub root: PathBuf,
    pub config: EffectiveConfig,
    storage: Arc<FsStorage>,
}

impl Project {
    /// Locate the project by walking up from `start` to the nearest
    /// directory containing `.docket/`.
    ///
    /// # Errors
    ///
    /// Fails when no ancestor holds a `.docket` directory, or when a config
    /// file exists but is invalid.
    pub fn discover(start: &Path, cli_json: bool) -> Result<Self> {
        let root = find_docket_root(start).ok_or_else(|| {
            anyhow!("not a docket project (no .docket directory found); run 'dk init' first")
        })?;
        let config = config::resolve_config(&root, cli_json)?;
        let storage = Arc::new(FsStorage::new(root.join(".docket")));
        Ok(Self {
            root,
            config,
            storage,
        })
    }

    #[must_use]
    pub fn output(&self) -> OutputMode {
        OutputMode::from_resolved(&self.config.resolved_output)
    }

    /// Task repository wired with the project config and the logging bus.
    #[must_use]
    pub fn tasks(&self) -> TaskRepository {
        TaskRepository::new(self.storage(), self.config.project.clone())
            .with_events(Arc::new(LogBus))
    }

    #[must_use]
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.storage()).with_events(Arc::new(LogBus))
    }

    #[must_use]
    pub fn feedback(&self) -> FeedbackRepository {
        FeedbackRepository::new(self.storage()).with_events(Arc::new(LogBus))
    }

    fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage) as Arc<dyn Storage>
    }
}

fn find_docket_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(".docket").is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Allocate the next sequential id for `prefix`: one past the highest
/// existing number, starting at `<prefix>-1`.
pub fn next_id<'a>(prefix: &str, existing: impl Iterator<Item = &'a str>) -> String {
    let highest = existing
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|rest| rest.strip_prefix('-'))
        .filter_map(|number| number.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}-{}", highest + 1)
}

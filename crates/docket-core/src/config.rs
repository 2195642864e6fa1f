//! Layered configuration.
//!
//! Project settings live at `<project>/.docket/config.toml` and user
//! preferences at `docket/config.toml` under the platform config directory.
//! Both files are optional: a missing file means defaults, while a file
//! that exists but fails to parse or validate is an error.

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::str::FromStr;

use crate::model::progress::ProgressState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            progress: ProgressConfig::default(),
            tasks: TaskConfig::default(),
        }
    }
}

impl ProjectConfig {
    fn validate(&self) -> Result<()> {
        for (state, percentage) in &self.progress.state_percentages {
            ProgressState::from_str(state)
                .map_err(|err| anyhow!("{err} in [progress.state_percentages]"))?;
            ensure!(
                *percentage <= 100,
                "percentage {percentage} for state '{state}' exceeds 100"
            );
        }
        let priority = self.tasks.default_priority;
        ensure!(
            (1..=5).contains(&priority),
            "default priority {priority} out of range 1..=5"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Whether completed tasks may move back to `in_development`.
    #[serde(default = "default_true")]
    pub allow_reopen: bool,
    /// Per-state completion percentage overrides, keyed by state name.
    #[serde(default)]
    pub state_percentages: BTreeMap<String, u8>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            allow_reopen: default_true(),
            state_percentages: BTreeMap::new(),
        }
    }
}

impl ProgressConfig {
    /// Effective completion percentage for `state`: the configured override
    /// when present, the built-in ladder otherwise.
    #[must_use]
    pub fn percentage_for(&self, state: ProgressState) -> u8 {
        self.state_percentages
            .get(state.as_str())
            .copied()
            .unwrap_or_else(|| state.default_percentage())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default = "default_priority")]
    pub default_priority: u8,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Load `<project_root>/.docket/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Fails when the file exists but cannot be read, parsed, or validated.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".docket/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

/// Load the user-level config, or defaults when absent.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("docket/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load both config layers and resolve the output mode.
///
/// # Errors
///
/// Fails when either config file exists but is unreadable or invalid.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("DOCKET_FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format)?;

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> Result<String> {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            // canonical values
            "human" => Some("human"),
            "json" => Some("json"),
            // legacy compatibility
            "pretty" | "text" | "table" => Some("human"),
            _ => None,
        }
    }

    if cli_json {
        return Ok("json".to_string());
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    Ok("human".to_string())
}

const fn default_true() -> bool {
    true
}

const fn default_priority() -> u8 {
    3
}

#[cfg(test)]
mod tests {
    use super::{ProjectConfig, load_project_config, resolve_output};
    use crate::model::progress::ProgressState;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(root: &TempDir, contents: &str) {
        let dir = root.path().join(".docket");
        fs::create_dir_all(&dir).expect("create .docket");
        fs::write(dir.join("config.toml"), contents).expect("write config");
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = TempDir::new().expect("tempdir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert!(cfg.progress.allow_reopen);
        assert!(cfg.progress.state_percentages.is_empty());
        assert_eq!(cfg.tasks.default_priority, 3);
    }

    #[test]
    fn overrides_parse_and_apply() {
        let root = TempDir::new().expect("tempdir");
        write_config(
            &root,
            r#"
[progress]
allow_reopen = false

[progress.state_percentages]
in_review = 80

[tasks]
default_priority = 2
"#,
        );

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert!(!cfg.progress.allow_reopen);
        assert_eq!(cfg.progress.percentage_for(ProgressState::InReview), 80);
        assert_eq!(
            cfg.progress.percentage_for(ProgressState::InDevelopment),
            25,
            "unconfigured states keep the built-in ladder"
        );
        assert_eq!(cfg.tasks.default_priority, 2);
    }

    #[test]
    fn percentage_above_100_is_rejected() {
        let root = TempDir::new().expect("tempdir");
        write_config(&root, "[progress.state_percentages]\nin_review = 120\n");

        let err = load_project_config(root.path()).expect_err("must fail validation");
        assert!(format!("{err:#}").contains("exceeds 100"), "err: {err:#}");
    }

    #[test]
    fn unknown_state_name_is_rejected() {
        let root = TempDir::new().expect("tempdir");
        write_config(&root, "[progress.state_percentages]\ndone = 90\n");

        let err = load_project_config(root.path()).expect_err("must fail validation");
        assert!(format!("{err:#}").contains("done"), "err: {err:#}");
    }

    #[test]
    fn out_of_range_priority_is_rejected() {
        let root = TempDir::new().expect("tempdir");
        write_config(&root, "[tasks]\ndefault_priority = 9\n");

        assert!(load_project_config(root.path()).is_err());
    }

    #[test]
    fn default_config_validates() {
        assert!(ProjectConfig::default().validate().is_ok());
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("human".to_string()), Some("human".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_user_config() {
        let output = resolve_output(false, Some("human".to_string()), Some("json".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "json");
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        let output = resolve_output(false, Some("pretty".to_string()), None)
            .expect("resolve should succeed");
        assert_eq!(output, "human");
    }

    #[test]
    fn unrecognized_values_fall_through() {
        let output = resolve_output(false, Some("bogus".to_string()), Some("nope".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "human");
    }
}

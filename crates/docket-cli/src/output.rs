//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler resolves an [`OutputMode`] and formats its output
//! accordingly: labelled text for humans, stable JSON for machines. Mode
//! resolution itself lives in `docket_core::config`; this module only maps
//! the resolved name onto a mode and renders.

use serde::Serialize;
use std::io::{self, Write};

use docket_core::RepoError;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Map a resolved output name (`"human"` or `"json"`) onto a mode.
    /// Anything unrecognized renders for humans.
    #[must_use]
    pub fn from_resolved(resolved: &str) -> Self {
        if resolved == "json" {
            Self::Json
        } else {
            Self::Human
        }
    }

    /// Returns `true` if JSON output was requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "not_found", "validation").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }
}

impl From<&RepoError> for CliError {
    fn from(err: &RepoError) -> Self {
        let root = err.root();
        let (suggestion, error_code) = match root {
            RepoError::NotFound { .. } => {
                (Some("Run 'dk list' to see known ids"), "not_found")
            }
            RepoError::Validation { .. } => (None, "validation"),
            RepoError::DataConsistency { .. } => (
                Some("Inspect the document under .docket/ or restore an archived version"),
                "data_consistency",
            ),
            RepoError::Storage(_) => (None, "storage"),
            RepoError::Op { .. } => (None, "internal"),
        };
        Self {
            message: root.to_string(),
            suggestion: suggestion.map(str::to_string),
            error_code: Some(error_code.to_string()),
        }
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In human mode,
/// the provided `human_fn` closure produces the text output.
///
/// # Errors
///
/// Fails when serialization or writing to stdout fails.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Human => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
///
/// # Errors
///
/// Fails when serialization or writing to stderr fails.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render a success message to stdout.
///
/// # Errors
///
/// Fails when serialization or writing to stdout fails.
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "ok": true,
                "message": message,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            writeln!(out, "✓ {message}")?;
        }
    }
    Ok(())
}

/// Render a left-aligned key/value line in human output.
///
/// # Errors
///
/// Fails when writing to `w` fails.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

#[cfg(test)]
mod tests {
    use super::{CliError, OutputMode, kv, render, render_error, render_success};
    use docket_core::RepoError;
    use std::io::Write;

    #[test]
    fn from_resolved_maps_names() {
        assert_eq!(OutputMode::from_resolved("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_resolved("human"), OutputMode::Human);
        assert_eq!(OutputMode::from_resolved("anything"), OutputMode::Human);
        assert!(OutputMode::Json.is_json());
        assert!(!OutputMode::Human.is_json());
    }

    #[test]
    fn cli_error_simple() {
        let err = CliError::new("something went wrong");
        assert_eq!(err.message, "something went wrong");
        assert!(err.suggestion.is_none());
        assert!(err.error_code.is_none());
    }

    #[test]
    fn cli_error_with_details() {
        let err = CliError::with_details("bad state", "Use one of the listed states", "validation");
        assert_eq!(err.suggestion.as_deref(), Some("Use one of the listed states"));
        assert_eq!(err.error_code.as_deref(), Some("validation"));
    }

    #[test]
    fn repo_error_maps_to_codes_through_wrapping() {
        let err = RepoError::not_found("task", "task-9");
        let cli = CliError::from(&err);
        assert!(cli.message.contains("task-9"));
        assert_eq!(cli.error_code.as_deref(), Some("not_found"));
        assert!(cli.suggestion.is_some());

        let wrapped = RepoError::Validation {
            subject: "task 'task-1'".to_string(),
            problems: vec!["title must not be empty".to_string()],
        };
        let cli = CliError::from(&wrapped);
        assert_eq!(cli.error_code.as_deref(), Some("validation"));
        assert!(cli.message.contains("title must not be empty"));
    }

    #[test]
    fn render_json_does_not_panic() {
        #[derive(serde::Serialize)]
        struct Payload {
            name: String,
        }
        let payload = Payload {
            name: "test".to_string(),
        };
        assert!(render(OutputMode::Json, &payload, |_, _| Ok(())).is_ok());
        assert!(
            render(OutputMode::Human, &payload, |p, w| writeln!(w, "{}", p.name)).is_ok()
        );
    }

    #[test]
    fn render_error_and_success_do_not_panic() {
        let err = CliError::with_details("bad input", "try again", "bad_input");
        assert!(render_error(OutputMode::Json, &err).is_ok());
        assert!(render_error(OutputMode::Human, &err).is_ok());
        assert!(render_success(OutputMode::Json, "it worked").is_ok());
        assert!(render_success(OutputMode::Human, "it worked").is_ok());
    }

    #[test]
    fn kv_aligns_keys() {
        let mut buf = Vec::new();
        kv(&mut buf, "id", "task-1").unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert!(line.starts_with("id:"));
        assert!(line.trim_end().ends_with("task-1"));
    }
}

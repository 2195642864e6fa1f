//! Error taxonomy for repository operations.
//!
//! Faults split into two classes. *Expected* faults are domain verdicts
//! (a record that does not exist, a record that fails validation, data that
//! contradicts itself) and log at warn level. Everything else is an
//! infrastructure failure and logs at error level. Every fault escaping a
//! repository operation is wrapped with the operation name, so chains read
//! `create_task: data consistency violation: ...`.

use thiserror::Error;

use crate::store::StorageError;

#[derive(Debug, Error)]
pub enum RepoError {
    /// The requested record does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A record or hierarchy failed field validation; nothing was written.
    /// Carries every problem found, not just the first.
    #[error("validation failed for {subject}: {}", problems.join("; "))]
    Validation {
        subject: String,
        problems: Vec<String>,
    },

    /// The stored data contradicts itself: duplicate ids, corrupt or
    /// malformed documents.
    #[error("data consistency violation: {detail}")]
    DataConsistency { detail: String },

    /// The storage gateway failed.
    #[error("storage fault: {0}")]
    Storage(#[source] StorageError),

    /// A fault wrapped with the operation that raised it.
    #[error("{operation}")]
    Op {
        operation: &'static str,
        #[source]
        source: Box<RepoError>,
    },
}

impl RepoError {
    pub(crate) fn op(operation: &'static str, source: Self) -> Self {
        Self::Op {
            operation,
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn validation(subject: impl Into<String>, problems: Vec<String>) -> Self {
        Self::Validation {
            subject: subject.into(),
            problems,
        }
    }

    #[must_use]
    pub fn consistency(detail: impl Into<String>) -> Self {
        Self::DataConsistency {
            detail: detail.into(),
        }
    }

    /// `true` for domain verdicts, `false` for infrastructure failures.
    /// Drives the warn/error split in operation logging.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Validation { .. } | Self::DataConsistency { .. } => true,
            Self::Storage(_) => false,
            Self::Op { source, .. } => source.is_expected(),
        }
    }

    /// The innermost fault, unwrapping operation frames.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Op { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(err: StorageError) -> Self {
        // Corrupt documents are a data problem, not an infrastructure one:
        // the disk worked fine, the bytes on it are wrong.
        if matches!(err, StorageError::Corrupt { .. }) {
            Self::DataConsistency {
                detail: err.to_string(),
            }
        } else {
            Self::Storage(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use crate::store::StorageError;
    use std::path::PathBuf;

    fn io_fault() -> StorageError {
        StorageError::Io {
            action: "read",
            path: PathBuf::from("/tmp/docket/tasks/current-tasks.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    #[test]
    fn expected_classification() {
        assert!(RepoError::not_found("task", "task-1").is_expected());
        assert!(RepoError::validation("task 'task-1'", vec!["bad".to_string()]).is_expected());
        assert!(RepoError::consistency("duplicate task id 'task-1'").is_expected());
        assert!(!RepoError::Storage(io_fault()).is_expected());
    }

    #[test]
    fn op_wrapping_preserves_classification() {
        let wrapped = RepoError::op("create_task", RepoError::not_found("task", "task-1"));
        assert!(wrapped.is_expected());

        let wrapped = RepoError::op("find_all", RepoError::Storage(io_fault()));
        assert!(!wrapped.is_expected());
    }

    #[test]
    fn root_unwraps_nested_frames() {
        let inner = RepoError::not_found("task", "task-1");
        let wrapped = RepoError::op("find_task", RepoError::op("find_by_id", inner));
        assert!(matches!(
            wrapped.root(),
            RepoError::NotFound { kind: "task", .. }
        ));
    }

    #[test]
    fn validation_display_lists_every_problem() {
        let err = RepoError::validation(
            "task 'task-1'",
            vec!["title must not be empty".to_string(), "priority 9 out of range".to_string()],
        );
        let display = err.to_string();
        assert!(display.contains("title must not be empty"), "display: {display}");
        assert!(display.contains("priority 9 out of range"), "display: {display}");
    }

    #[test]
    fn corrupt_storage_maps_to_consistency() {
        let corrupt = StorageError::Corrupt {
            path: PathBuf::from("/tmp/x.json"),
            source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        };
        let repo_err = RepoError::from(corrupt);
        assert!(matches!(repo_err, RepoError::DataConsistency { .. }));
        assert!(repo_err.is_expected());
    }
}

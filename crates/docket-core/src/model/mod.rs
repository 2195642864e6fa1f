//! Domain records and the collection documents that hold them.
//!
//! Every record kind (tasks, sessions, feedback) persists as one JSON
//! document per kind: the *collection document*. The [`Record`] and
//! [`Collection`] traits are the seam the generic repository works through;
//! the concrete types live in the submodules.

pub mod feedback;
pub mod hierarchy;
pub mod progress;
pub mod session;
pub mod task;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

use crate::validate::ValidationReport;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

/// A persisted record with a caller-assigned id.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Singular entity noun, used for storage paths and log fields.
    const KIND: &'static str;

    /// Partial update accepted by [`Record::apply_patch`].
    type Patch: Send;

    fn id(&self) -> &str;

    /// Apply a partial update. Set fields replace the record's values; list
    /// fields replace wholesale, they are never merged element-wise.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Field-level verdict for this record. Pure: no storage, no clock.
    fn validate(&self) -> ValidationReport;

    /// Set both timestamps at creation time.
    fn stamp_created(&mut self, at: DateTime<Utc>);

    /// Bump `updated_at` after a mutation.
    fn touch(&mut self, at: DateTime<Utc>);
}

/// The whole current document for one record kind.
///
/// Mutations load the document, edit it in memory, and write it back whole,
/// so sibling fields a mutation does not touch survive the round trip.
pub trait Collection: Default + Serialize + DeserializeOwned + Send + Sync {
    type Record: Record;

    fn records(&self) -> &[Self::Record];
    fn records_mut(&mut self) -> &mut Vec<Self::Record>;
}

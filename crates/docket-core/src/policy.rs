//! Pluggable fault handling for read paths.
//!
//! Some deployments want a corrupt or missing document to read as empty
//! rather than fail the whole command. A [`FaultPolicy`] makes that call
//! per operation. Policies are consulted only where a safe fallback exists,
//! which in practice means list-shaped reads; mutations always escalate so
//! a failed write is never reported as success.

use crate::error::RepoError;

/// What to do with a fault when the operation has a safe fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Propagate the fault to the caller.
    Escalate,
    /// Swallow the fault and return the operation's fallback value.
    Recover,
}

/// Per-fault decision seam, injected into repositories.
pub trait FaultPolicy: Send + Sync {
    fn disposition(&self, operation: &str, error: &RepoError) -> Disposition;
}

/// Escalates everything. Behavior when no policy is injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalateAll;

impl FaultPolicy for EscalateAll {
    fn disposition(&self, _operation: &str, _error: &RepoError) -> Disposition {
        Disposition::Escalate
    }
}

/// Recovers domain verdicts (missing, invalid, inconsistent data) and
/// escalates infrastructure failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverExpected;

impl FaultPolicy for RecoverExpected {
    fn disposition(&self, _operation: &str, error: &RepoError) -> Disposition {
        if error.is_expected() {
            Disposition::Recover
        } else {
            Disposition::Escalate
        }
    }
}

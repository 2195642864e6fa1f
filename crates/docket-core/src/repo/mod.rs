//! Persistence operations over the collection documents.

mod base;
mod task;

pub use base::Repository;
pub use task::TaskRepository;

use crate::model::feedback::FeedbackCollection;
use crate::model::session::SessionCollection;

/// Repository over the sessions document.
pub type SessionRepository = Repository<SessionCollection>;

/// Repository over the feedback document.
pub type FeedbackRepository = Repository<FeedbackCollection>;

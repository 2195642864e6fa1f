#![forbid(unsafe_code)]

//! docket-core library.
//!
//! File-backed persistence for project records: tasks with dependencies and
//! progress tracking, work sessions, and feedback. Each record kind lives in
//! one JSON collection document; every mutation archives the previous
//! version of the record it touches, and every write is atomic.
//!
//! # Conventions
//!
//! - **Errors**: repository operations return [`RepoError`]; setup helpers
//!   use `anyhow::Result` where appropriate.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `error!`,
//!   `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod model;
pub mod policy;
pub mod repo;
pub mod store;
pub mod validate;

pub use error::RepoError;
pub use repo::{FeedbackRepository, Repository, SessionRepository, TaskRepository};
pub use store::FsStorage;

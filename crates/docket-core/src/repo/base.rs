//! Generic repository over one collection document.
//!
//! # Overview
//!
//! [`Repository`] implements CRUD, bulk operations, and history for any
//! [`Collection`] type: load the whole document, mutate it in memory, write
//! it back atomically. Sibling fields a mutation does not touch survive
//! because the document always round-trips whole.
//!
//! # Design
//!
//! Every public operation runs inside [`Repository::guard`], which owns the
//! logging split (warn for domain verdicts, error for infrastructure
//! faults), wraps escaping errors with the operation name, and consults the
//! injected [`FaultPolicy`] where a safe fallback exists. Only list-shaped
//! reads carry a fallback; mutations always escalate.
//!
//! Concurrent processes get atomicity per write, not serialization: two
//! writers can interleave load and store so the slower one erases the
//! faster one's record mutation. The rename-based write guarantees the
//! document is never torn, nothing more.

use chrono::{DateTime, Utc};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::RepoError;
use crate::events::{EventBus, NullBus, RepoEvent};
use crate::model::{Collection, Record};
use crate::policy::{Disposition, FaultPolicy};
use crate::store::{HistoryEntry, Storage, StorageError};

/// Generic persistence operations for one record kind.
pub struct Repository<C: Collection> {
    storage: Arc<dyn Storage>,
    events: Arc<dyn EventBus>,
    policy: Option<Arc<dyn FaultPolicy>>,
    _collection: PhantomData<fn() -> C>,
}

impl<C: Collection> Repository<C> {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            events: Arc::new(NullBus),
            policy: None,
            _collection: PhantomData,
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventBus>) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn FaultPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    const fn kind() -> &'static str {
        <C::Record as Record>::KIND
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Every record in the collection.
    ///
    /// # Errors
    ///
    /// Storage and parse faults, wrapped with the operation name. A policy
    /// may recover this read to an empty list.
    pub fn find_all(&self) -> Result<Vec<C::Record>, RepoError> {
        self.guard("find_all", None, Some(Vec::new()), || {
            Ok(self.load()?.records().to_vec())
        })
    }

    /// The record with `id`.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] when no record has `id`; storage and parse
    /// faults otherwise. Point reads have no safe fallback, so the policy is
    /// never consulted here.
    pub fn find_by_id(&self, id: &str) -> Result<C::Record, RepoError> {
        self.guard("find_by_id", Some(id), None, || self.fetch(id))
    }

    /// Records matching `predicate`, in document order.
    ///
    /// # Errors
    ///
    /// Storage and parse faults. A policy may recover this read to an empty
    /// list.
    pub fn find_where(
        &self,
        predicate: impl Fn(&C::Record) -> bool,
    ) -> Result<Vec<C::Record>, RepoError> {
        self.guard("find_where", None, Some(Vec::new()), || {
            let collection = self.load()?;
            Ok(collection
                .records()
                .iter()
                .filter(|record| predicate(record))
                .cloned()
                .collect())
        })
    }

    /// Archived snapshots for `id`, newest first. Works for deleted records
    /// too, which is the main reason history exists.
    ///
    /// # Errors
    ///
    /// Storage faults. A policy may recover this read to an empty list.
    pub fn history(&self, id: &str) -> Result<Vec<HistoryEntry>, RepoError> {
        self.guard("history", Some(id), Some(Vec::new()), || {
            let entries = self.storage.list_history(Self::kind(), id)?;
            Ok(entries)
        })
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Validate and insert a new record, returning it with stamped
    /// timestamps.
    ///
    /// # Errors
    ///
    /// [`RepoError::Validation`] listing every field problem,
    /// [`RepoError::DataConsistency`] on a duplicate id, storage faults
    /// otherwise. Nothing is written on failure.
    pub fn create(&self, record: C::Record) -> Result<C::Record, RepoError> {
        let id = record.id().to_string();
        self.guard("create", Some(&id), None, || {
            let mut collection = self.load()?;
            let created = Self::insert_record(&mut collection, record, Utc::now())?;
            self.store(&collection)?;
            self.notify(&RepoEvent::RecordCreated {
                kind: Self::kind(),
                id: created.id().to_string(),
            });
            Ok(created)
        })
    }

    /// Apply a patch to the record with `id`. The previous version is
    /// archived before the document is rewritten.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] for an unknown id, [`RepoError::Validation`]
    /// when the patched record fails validation, storage faults otherwise.
    pub fn update(
        &self,
        id: &str,
        patch: <C::Record as Record>::Patch,
    ) -> Result<C::Record, RepoError> {
        self.guard("update", Some(id), None, || {
            let now = Utc::now();
            let mut collection = self.load()?;
            let (previous, updated) = Self::patch_record(&mut collection, id, patch, now)?;
            self.archive_record(&previous, now)?;
            self.store(&collection)?;
            self.notify(&RepoEvent::RecordUpdated {
                kind: Self::kind(),
                id: updated.id().to_string(),
            });
            Ok(updated)
        })
    }

    /// Remove the record with `id`, archiving its final state first.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] for an unknown id, storage faults otherwise.
    pub fn delete(&self, id: &str) -> Result<(), RepoError> {
        self.guard("delete", Some(id), None, || {
            let now = Utc::now();
            let mut collection = self.load()?;
            let removed = Self::remove_record(&mut collection, id)?;
            self.archive_record(&removed, now)?;
            self.store(&collection)?;
            self.notify(&RepoEvent::RecordDeleted {
                kind: Self::kind(),
                id: removed.id().to_string(),
            });
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Bulk operations
    // -----------------------------------------------------------------------

    /// Insert several records with one document write. All or nothing: the
    /// first invalid or duplicate record fails the whole batch and leaves
    /// the document untouched.
    ///
    /// # Errors
    ///
    /// Same as [`Repository::create`], raised for the first offending
    /// record.
    pub fn create_many(&self, records: Vec<C::Record>) -> Result<Vec<C::Record>, RepoError> {
        self.guard("create_many", None, None, || {
            let now = Utc::now();
            let mut collection = self.load()?;
            let mut created = Vec::with_capacity(records.len());
            for record in records {
                created.push(Self::insert_record(&mut collection, record, now)?);
            }
            self.store(&collection)?;
            for record in &created {
                self.notify(&RepoEvent::RecordCreated {
                    kind: Self::kind(),
                    id: record.id().to_string(),
                });
            }
            Ok(created)
        })
    }

    /// Apply several patches with one document write. Patches apply in
    /// order against the in-memory document, so two patches for the same id
    /// compose rather than racing. All or nothing, like
    /// [`Repository::create_many`].
    ///
    /// # Errors
    ///
    /// Same as [`Repository::update`], raised for the first offending
    /// patch.
    pub fn update_many(
        &self,
        updates: Vec<(String, <C::Record as Record>::Patch)>,
    ) -> Result<Vec<C::Record>, RepoError> {
        self.guard("update_many", None, None, || {
            let now = Utc::now();
            let mut collection = self.load()?;
            let mut previous_versions = Vec::with_capacity(updates.len());
            let mut updated_records = Vec::with_capacity(updates.len());
            for (id, patch) in updates {
                let (previous, updated) = Self::patch_record(&mut collection, &id, patch, now)?;
                previous_versions.push(previous);
                updated_records.push(updated);
            }
            for previous in &previous_versions {
                self.archive_record(previous, now)?;
            }
            self.store(&collection)?;
            for record in &updated_records {
                self.notify(&RepoEvent::RecordUpdated {
                    kind: Self::kind(),
                    id: record.id().to_string(),
                });
            }
            Ok(updated_records)
        })
    }

    /// Remove several records with one document write, returning how many
    /// existed. Unknown ids are skipped, not errors: bulk delete is cleanup,
    /// and cleanup of an already-absent record has already succeeded.
    ///
    /// # Errors
    ///
    /// Storage faults. When nothing matched, the document is not rewritten.
    pub fn delete_many(&self, ids: &[String]) -> Result<usize, RepoError> {
        self.guard("delete_many", None, None, || {
            let now = Utc::now();
            let mut collection = self.load()?;
            let mut removed = Vec::new();
            for id in ids {
                match Self::remove_record(&mut collection, id) {
                    Ok(record) => removed.push(record),
                    Err(RepoError::NotFound { .. }) => {
                        debug!(kind = Self::kind(), id = id.as_str(), "bulk delete skipping missing record");
                    }
                    Err(err) => return Err(err),
                }
            }
            if removed.is_empty() {
                return Ok(0);
            }
            for record in &removed {
                self.archive_record(record, now)?;
            }
            self.store(&collection)?;
            for record in &removed {
                self.notify(&RepoEvent::RecordDeleted {
                    kind: Self::kind(),
                    id: record.id().to_string(),
                });
            }
            Ok(removed.len())
        })
    }

    // -----------------------------------------------------------------------
    // Internals shared with the domain repositories
    // -----------------------------------------------------------------------

    pub(crate) fn load(&self) -> Result<C, RepoError> {
        let Some(text) = self.storage.read(Self::kind())? else {
            return Ok(C::default());
        };
        serde_json::from_str(&text).map_err(|err| {
            RepoError::consistency(format!("malformed {} document: {err}", Self::kind()))
        })
    }

    pub(crate) fn store(&self, collection: &C) -> Result<(), RepoError> {
        let text =
            serde_json::to_string_pretty(collection).map_err(|source| StorageError::Encode {
                kind: Self::kind(),
                source,
            })?;
        self.storage.write(Self::kind(), &text)?;
        Ok(())
    }

    pub(crate) fn archive_record(
        &self,
        record: &C::Record,
        at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let text = serde_json::to_string_pretty(record).map_err(|source| StorageError::Encode {
            kind: Self::kind(),
            source,
        })?;
        self.storage.archive(Self::kind(), record.id(), &text, at)?;
        Ok(())
    }

    pub(crate) fn fetch(&self, id: &str) -> Result<C::Record, RepoError> {
        let collection = self.load()?;
        collection
            .records()
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| RepoError::not_found(Self::kind(), id))
    }

    pub(crate) fn insert_record(
        collection: &mut C,
        mut record: C::Record,
        at: DateTime<Utc>,
    ) -> Result<C::Record, RepoError> {
        let report = record.validate();
        if !report.is_valid() {
            return Err(RepoError::validation(
                format!("{} '{}'", Self::kind(), record.id()),
                report.into_problems(),
            ));
        }
        if collection
            .records()
            .iter()
            .any(|existing| existing.id() == record.id())
        {
            return Err(RepoError::consistency(format!(
                "duplicate {} id '{}'",
                Self::kind(),
                record.id()
            )));
        }
        record.stamp_created(at);
        collection.records_mut().push(record.clone());
        Ok(record)
    }

    pub(crate) fn patch_record(
        collection: &mut C,
        id: &str,
        patch: <C::Record as Record>::Patch,
        at: DateTime<Utc>,
    ) -> Result<(C::Record, C::Record), RepoError> {
        let Some(slot) = collection
            .records_mut()
            .iter_mut()
            .find(|record| record.id() == id)
        else {
            return Err(RepoError::not_found(Self::kind(), id));
        };

        let previous = slot.clone();
        let mut updated = previous.clone();
        updated.apply_patch(patch);
        updated.touch(at);

        let report = updated.validate();
        if !report.is_valid() {
            // The stored record is untouched: the patched copy never made it
            // into the collection.
            return Err(RepoError::validation(
                format!("{} '{id}'", Self::kind()),
                report.into_problems(),
            ));
        }

        *slot = updated.clone();
        Ok((previous, updated))
    }

    pub(crate) fn remove_record(collection: &mut C, id: &str) -> Result<C::Record, RepoError> {
        let records = collection.records_mut();
        let Some(index) = records.iter().position(|record| record.id() == id) else {
            return Err(RepoError::not_found(Self::kind(), id));
        };
        Ok(records.remove(index))
    }

    pub(crate) fn notify(&self, event: &RepoEvent) {
        if let Err(err) = self.events.publish(event) {
            warn!(error = %err, "event publication failed");
        }
    }

    /// Run `operation`, log its outcome, and wrap escaping faults with the
    /// operation name. When a fallback exists and a policy is injected, the
    /// policy may turn the fault into the fallback value instead.
    pub(crate) fn guard<T>(
        &self,
        operation: &'static str,
        id: Option<&str>,
        fallback: Option<T>,
        run: impl FnOnce() -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        match run() {
            Ok(value) => Ok(value),
            Err(err) => {
                if err.is_expected() {
                    warn!(operation, id = id.unwrap_or("-"), error = %err, "operation failed");
                } else {
                    error!(operation, id = id.unwrap_or("-"), error = %err, "operation failed");
                }
                if let (Some(fallback), Some(policy)) = (fallback, self.policy.as_ref()) {
                    if policy.disposition(operation, &err) == Disposition::Recover {
                        debug!(operation, "fault policy recovered with fallback");
                        return Ok(fallback);
                    }
                }
                Err(RepoError::op(operation, err))
            }
        }
    }
}

//! Per-thread access registry - the single authority over live handles.
//!
//! Every thread owns one independent [`AccessRegistry`], reached through a
//! `thread_local!`. There is no shared state across threads and therefore no
//! locking: resolution, unregistration, and relocation are synchronous,
//! non-interruptible steps. The registry is discarded without validation
//! when its thread ends.
//!
//! Cell identities are minted here from a monotonically increasing per-
//! thread counter, so an identity is never reused and never depends on a
//! memory address.

pub(crate) mod record;

use core::cell::RefCell;
use core::fmt;
use core::num::NonZeroU64;
use core::ptr::NonNull;
use std::collections::HashMap;

use crate::violation::{AccessSite, Violation};

pub(crate) use record::{AccessRecord, AccessorRef};

/// Stable identity of a tracked cell.
///
/// Minted per cell construction and per relocation; identities are unique
/// within their thread for the lifetime of the registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CellId(NonZeroU64);

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId(#{})", self.0)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observable composition of one access record.
///
/// Returned by [`snapshot`]; intended for tests and debug tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RecordSnapshot {
    /// Owner tags of the currently resolved read handles, in registration
    /// order.
    pub readers: Vec<AccessSite>,
    /// Owner tag of the currently resolved write handle, if any.
    pub writer: Option<AccessSite>,
}

impl RecordSnapshot {
    /// `true` when no handle is currently resolved against the cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty() && self.writer.is_none()
    }
}

/// Per-thread table mapping cell identities to their access records.
pub(crate) struct AccessRegistry {
    records: HashMap<CellId, AccessRecord>,
    next_id: u64,
}

impl AccessRegistry {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            next_id: 0,
        }
    }

    /// Mints a fresh, never-reused cell identity.
    pub(crate) fn mint_id(&mut self) -> CellId {
        self.next_id += 1;
        // The counter starts at one and only increments.
        let id = NonZeroU64::new(self.next_id).expect("cell identity counter wrapped");
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "warden", id = %id, "minted cell identity");
        CellId(id)
    }

    /// Returns the record for a cell, creating an empty one if absent.
    pub(crate) fn ensure_record(&mut self, id: CellId) {
        self.records.entry(id).or_default();
    }

    /// Applies the conflict rule against the accessor's target record and
    /// attaches it. The `Err` is raised (fatally) by the caller once the
    /// registry borrow is released.
    pub(crate) fn register(&mut self, accessor: AccessorRef) -> Result<(), Violation> {
        let (id, mode, owner) = describe(accessor);
        let Some(record) = self.records.get_mut(&id) else {
            // The record vanishes only when the cell is destroyed.
            return Err(Violation::AccessorOutlivedCell {
                attempted: owner,
                mode,
                cell: id,
            });
        };
        record.admit(accessor)?;
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "warden", cell = %id, mode = %mode, site = %owner, "handle resolved");
        Ok(())
    }

    /// Removes a resolved accessor from its record.
    ///
    /// Unresolved accessors never call in. Failure here is not caller
    /// misuse; it indicates a defect in the tracking mechanism.
    pub(crate) fn unregister(&mut self, accessor: AccessorRef) -> Result<(), Violation> {
        let (id, mode, owner) = describe(accessor);
        let Some(record) = self.records.get_mut(&id) else {
            return Err(Violation::InvariantBroken {
                attempted: Some(owner),
                detail: "resolved handle unregistering against an untracked cell",
            });
        };
        if !record.detach(accessor) {
            return Err(Violation::InvariantBroken {
                attempted: Some(owner),
                detail: "resolved handle missing from its record",
            });
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "warden", cell = %id, mode = %mode, site = %owner, "handle released");
        #[cfg(not(feature = "tracing"))]
        let _ = mode;
        Ok(())
    }

    /// Relocation: re-keys the record found at `old` under `new` and rewrites
    /// every member's target binding to the new identity and storage, in one
    /// synchronous step. Absent `old` record means nothing to do.
    pub(crate) fn transfer(&mut self, old: CellId, new: CellId, data: NonNull<()>) {
        let Some(record) = self.records.remove(&old) else {
            return;
        };
        record.retarget(new, data);
        self.records.insert(new, record);
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "warden", old = %old, new = %new, "record transferred");
    }

    /// Drops the record for a destroyed cell, returning it so the caller can
    /// check for still-live members.
    pub(crate) fn remove_record(&mut self, id: CellId) -> Option<AccessRecord> {
        self.records.remove(&id)
    }

    /// Number of readers currently resolved against `id` (zero if the
    /// record is absent).
    pub(crate) fn reader_count(&self, id: CellId) -> usize {
        self.records.get(&id).map_or(0, AccessRecord::reader_count)
    }

    /// Whether a writer is currently resolved against `id`.
    pub(crate) fn record_has_writer(&self, id: CellId) -> bool {
        self.records.get(&id).is_some_and(AccessRecord::has_writer)
    }

    fn snapshot(&self, id: CellId) -> Option<RecordSnapshot> {
        self.records.get(&id).map(|record| RecordSnapshot {
            readers: record.reader_sites(),
            writer: record.writer_site(),
        })
    }
}

fn describe(accessor: AccessorRef) -> (CellId, crate::accessor::AccessMode, AccessSite) {
    // SAFETY: the accessor is live; it is either resolving right now or
    // unregistering from its own drop.
    let core = unsafe { accessor.as_core() };
    (core.target(), core.mode(), core.owner())
}

thread_local! {
    static REGISTRY: RefCell<AccessRegistry> = RefCell::new(AccessRegistry::new());
}

/// Runs `f` against this thread's registry.
///
/// Panics if called during thread-local teardown; construction and
/// resolution paths are never reached from there.
pub(crate) fn with<R>(f: impl FnOnce(&mut AccessRegistry) -> R) -> R {
    REGISTRY.with(|registry| f(&mut registry.borrow_mut()))
}

/// Like [`with`], but a no-op during thread-local teardown. Used by drop
/// paths: the registry is discarded without validation at thread end, so a
/// handle or cell dropped after that has nothing left to update.
pub(crate) fn try_with<R>(f: impl FnOnce(&mut AccessRegistry) -> R) -> Option<R> {
    REGISTRY
        .try_with(|registry| f(&mut registry.borrow_mut()))
        .ok()
}

/// Whether this thread's registry currently holds a record for `id`.
#[must_use]
pub fn is_tracked(id: CellId) -> bool {
    with(|registry| registry.records.contains_key(&id))
}

/// Observable composition of the record for `id`, if one exists.
#[must_use]
pub fn snapshot(id: CellId) -> Option<RecordSnapshot> {
    with(|registry| registry.snapshot(id))
}

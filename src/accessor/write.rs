//! Exclusive write handle.

use core::marker::PhantomData;

use crate::accessor::{AccessMode, AccessorCore};
use crate::cell::Cell;
use crate::registry;
use crate::violation::AccessSite;

/// An exclusive, mutable handle to a [`Cell`].
///
/// At most one write handle may be resolved against a cell, and only while
/// zero read handles are resolved; violating either is fatal. The handle is
/// deliberately not `Clone` - exclusive access is singular, so duplicating
/// it is a compile-time error rather than a runtime race.
pub struct WriteAccessor<T> {
    core: Box<AccessorCore>,
    _marker: PhantomData<*mut T>,
}

impl<T> WriteAccessor<T> {
    /// Constructs a write handle bound to `cell`.
    ///
    /// Under the default (lazy) resolution mode this registers nothing; the
    /// handle resolves on first use. With the `aggressive` feature it
    /// resolves here, making a conflict fatal at construction.
    #[must_use]
    #[track_caller]
    pub fn new(cell: &Cell<T>) -> Self {
        let core = Box::new(AccessorCore::new(
            cell.id(),
            cell.data_ptr(),
            AccessMode::Write,
            AccessSite::caller(),
        ));
        registry::with(|r| r.ensure_record(cell.id()));
        let accessor = Self {
            core,
            _marker: PhantomData,
        };
        #[cfg(feature = "aggressive")]
        accessor.core.resolve();
        accessor
    }

    /// Reads the tracked value by value, resolving the handle if needed.
    #[must_use]
    pub fn read(&self) -> T
    where
        T: Clone,
    {
        self.get().clone()
    }

    /// Borrows the tracked value, resolving the handle if needed.
    #[inline]
    #[must_use]
    pub fn get(&self) -> &T {
        self.core.resolve();
        // SAFETY: resolution succeeded, so this handle holds the record's
        // exclusive writer slot: no other handle is live and the target cell
        // is alive.
        unsafe { &*self.core.value_ptr::<T>() }
    }

    /// Mutably borrows the tracked value, resolving the handle if needed.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.core.resolve();
        // SAFETY: as in `get`; `&mut self` additionally prevents aliasing
        // references created through this same handle.
        unsafe { &mut *self.core.value_ptr::<T>() }
    }

    /// Replaces the tracked value, resolving the handle if needed.
    pub fn write(&mut self, value: T) {
        *self.get_mut() = value;
    }

    /// Whether this handle has registered against its cell's record yet.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.core.is_resolved()
    }

    /// Owner tag reported for this handle in diagnostics.
    #[must_use]
    pub fn owner(&self) -> AccessSite {
        self.core.owner()
    }
}

impl<T> core::fmt::Debug for WriteAccessor<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WriteAccessor")
            .field("cell", &self.core.target())
            .field("owner", &self.core.owner())
            .field("resolved", &self.core.is_resolved())
            .finish()
    }
}

//! Shared read handle.

use core::marker::PhantomData;

use crate::accessor::{AccessMode, AccessorCore};
use crate::cell::Cell;
use crate::registry;
use crate::violation::AccessSite;

/// A shared, read-only handle to a [`Cell`].
///
/// Any number of read handles may be resolved against the same cell at the
/// same time; resolving one while a write handle is live is a fatal
/// violation. The handle is not lifetime-bound to the cell - that is the
/// point: the aliasing discipline is enforced at runtime, not by the
/// compile-time borrow checker.
///
/// Cloning produces a fresh, independently *unresolved* handle bound to the
/// same cell; read handles are interchangeable, so their relative
/// destruction order carries no meaning.
pub struct ReadAccessor<T> {
    core: Box<AccessorCore>,
    _marker: PhantomData<*mut T>,
}

impl<T> ReadAccessor<T> {
    /// Constructs a read handle bound to `cell`.
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
            AccessMode::Read,
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
        // SAFETY: resolution succeeded, so the record admitted this reader:
        // no write handle is live and the target cell is alive. The pointer
        // was rebound by any relocation that happened since construction.
        unsafe { &*self.core.value_ptr::<T>() }
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

impl<T> Clone for ReadAccessor<T> {
    /// Produces a fresh, unresolved read handle bound to the same cell.
    ///
    /// The clone's owner tag is the clone site.
    #[track_caller]
    fn clone(&self) -> Self {
        let core = Box::new(AccessorCore::new(
            self.core.target(),
            self.core.data(),
            AccessMode::Read,
            AccessSite::caller(),
        ));
        let accessor = Self {
            core,
            _marker: PhantomData,
        };
        #[cfg(feature = "aggressive")]
        accessor.core.resolve();
        accessor
    }
}

impl<T> core::fmt::Debug for ReadAccessor<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReadAccessor")
            .field("cell", &self.core.target())
            .field("owner", &self.core.owner())
            .field("resolved", &self.core.is_resolved())
            .finish()
    }
}

//! The owning wrapper around a tracked value.
//!
//! A [`Cell`] owns exactly one value and is the unit of identity for access
//! tracking. The value lives in a heap slot so that plain Rust moves of the
//! `Cell` never invalidate live handles: identity and storage both stay put.
//! [`Cell::relocate`] is the explicit ownership-transfer operation - it
//! hands the value to a fresh cell under a fresh identity and re-keys the
//! registry entry, rewriting every live handle's binding in place.

use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ptr::{self, NonNull};

use crate::registry::{self, CellId};
use crate::violation::Violation;

/// An owning wrapper that tracks read/write access to its value at runtime.
///
/// Construct handles against it with [`ReadAccessor::new`] and
/// [`WriteAccessor::new`]; overlapping handles that violate the
/// exclusive-writer / shared-readers discipline terminate the process with a
/// diagnostic.
///
/// Tracking is per-thread: a cell belongs to the thread that constructed it
/// and is neither `Send` nor `Sync`. Destroying a cell while resolved
/// handles are live is itself a detected violation.
///
/// [`ReadAccessor::new`]: crate::ReadAccessor::new
/// [`WriteAccessor::new`]: crate::WriteAccessor::new
///
/// # Example
///
/// ```
/// use warden::{Cell, ReadAccessor, WriteAccessor};
///
/// let cell = Cell::new(5);
/// {
///     let mut writer = WriteAccessor::new(&cell);
///     writer.write(7);
/// }
/// let reader = ReadAccessor::new(&cell);
/// assert_eq!(reader.read(), 7);
/// ```
pub struct Cell<T> {
    id: CellId,
    slot: Box<UnsafeCell<T>>,
    // Tracking is thread-local; keep the cell on its thread.
    _marker: PhantomData<*mut T>,
}

impl<T> Cell<T> {
    /// Wraps `value` in a tracked cell with a fresh identity.
    ///
    /// No access record is created yet; the record appears when the first
    /// handle is constructed against this cell.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            id: registry::with(|r| r.mint_id()),
            slot: Box::new(UnsafeCell::new(value)),
            _marker: PhantomData,
        }
    }

    /// The stable identity this cell is tracked under.
    #[inline]
    #[must_use]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Type-erased pointer to the tracked value's storage.
    #[inline]
    pub(crate) fn data_ptr(&self) -> NonNull<()> {
        // SAFETY: `UnsafeCell::get` on a live allocation is never null.
        unsafe { NonNull::new_unchecked(self.slot.get()) }.cast()
    }

    /// Transfers the value to a fresh cell under a fresh identity.
    ///
    /// Live handles stay attached: the registry entry is re-keyed and every
    /// member's binding is rewritten in place, without unregistering or
    /// re-registering anyone, so the record's composition is unchanged. The
    /// old identity is untracked afterwards. Relocating a cell with no live
    /// handles is a pure value move.
    ///
    /// The storage slot travels with the value, so references previously
    /// handed out by resolved handles remain valid across the transfer.
    /// Plain Rust moves of a `Cell` need none of this - the boxed slot
    /// keeps identity and storage stable. Relocation models handing the
    /// tracked value to a new cell, as in an ownership transfer between
    /// containers.
    #[must_use]
    pub fn relocate(self) -> Self {
        let old_id = self.id;
        // Disarm the old cell's drop: its registry entry moves wholesale
        // instead of being released.
        let old = ManuallyDrop::new(self);
        // SAFETY: `old` is never used again; we take sole ownership of the
        // slot.
        let slot = unsafe { ptr::read(&old.slot) };
        let relocated = Self {
            id: registry::with(|r| r.mint_id()),
            slot,
            _marker: PhantomData,
        };
        registry::with(|r| r.transfer(old_id, relocated.id, relocated.data_ptr()));
        relocated
    }

    /// Stops tracking and returns the wrapped value.
    ///
    /// Fatal if resolved handles are still live, exactly like dropping the
    /// cell would be.
    #[must_use]
    pub fn into_inner(self) -> T {
        let id = self.id;
        let this = ManuallyDrop::new(self);
        if let Some(record) = registry::with(|r| r.remove_record(id)) {
            if !record.is_empty() {
                Violation::DroppedWhileAccessed {
                    cell: id,
                    readers: record.reader_sites(),
                    writer: record.writer_site(),
                }
                .raise();
            }
        }
        // SAFETY: `this` is never used again; we take sole ownership of the
        // slot.
        let slot = unsafe { ptr::read(&this.slot) };
        slot.into_inner()
    }

    /// Number of read handles currently resolved against this cell.
    #[must_use]
    pub fn live_readers(&self) -> usize {
        registry::with(|r| r.reader_count(self.id))
    }

    /// Whether a write handle is currently resolved against this cell.
    #[must_use]
    pub fn has_writer(&self) -> bool {
        registry::with(|r| r.record_has_writer(self.id))
    }
}

impl<T> Drop for Cell<T> {
    fn drop(&mut self) {
        // No-op after thread-local teardown: the registry is discarded
        // without validation at thread end.
        let Some(removed) = registry::try_with(|r| r.remove_record(self.id)) else {
            return;
        };
        if let Some(record) = removed {
            if !record.is_empty() {
                Violation::DroppedWhileAccessed {
                    cell: self.id,
                    readers: record.reader_sites(),
                    writer: record.writer_site(),
                }
                .raise();
            }
        }
    }
}

impl<T: Default> Default for Cell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Cell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("id", &self.id)
            .field("value", &"<requires access handle>")
            .finish()
    }
}

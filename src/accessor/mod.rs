//! Lazily-resolving access handles.
//!
//! A handle is bound to one cell and one access kind at construction, but it
//! does not touch the cell's access record until it is actually used: the
//! first `read`/`get`/`write` call resolves the handle by registering it,
//! which is where the conflict rule runs. A handle constructed and destroyed
//! without ever being used leaves the registry untouched.
//!
//! With the `aggressive` feature enabled, construction itself resolves, so a
//! conflicting handle is reported at the point it is created rather than at
//! its first use.
//!
//! The state machine is `Unresolved -> Resolved -> (destroyed)`; a resolved
//! handle unregisters itself on drop.

mod read;
mod write;

pub use read::ReadAccessor;
pub use write::WriteAccessor;

use core::cell::Cell as StdCell;
use core::fmt;
use core::ptr::NonNull;

use crate::registry::{self, AccessorRef, CellId};
use crate::violation::AccessSite;

/// The access kind a handle was constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AccessMode {
    /// Shared, read-only access.
    Read,
    /// Exclusive, mutable access.
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// The resolution core shared by both handle types.
///
/// Heap-pinned inside the public handle (a `Box`), so the registry's
/// back-reference to it survives moves of the handle itself. The target
/// binding uses interior mutability because relocation rewrites it in place
/// through a shared reference.
pub(crate) struct AccessorCore {
    target: StdCell<CellId>,
    data: StdCell<NonNull<()>>,
    mode: AccessMode,
    owner: AccessSite,
    resolved: StdCell<bool>,
}

impl AccessorCore {
    pub(crate) fn new(
        target: CellId,
        data: NonNull<()>,
        mode: AccessMode,
        owner: AccessSite,
    ) -> Self {
        Self {
            target: StdCell::new(target),
            data: StdCell::new(data),
            mode,
            owner,
            resolved: StdCell::new(false),
        }
    }

    #[inline]
    pub(crate) fn target(&self) -> CellId {
        self.target.get()
    }

    #[inline]
    pub(crate) fn data(&self) -> NonNull<()> {
        self.data.get()
    }

    #[inline]
    pub(crate) fn mode(&self) -> AccessMode {
        self.mode
    }

    #[inline]
    pub(crate) fn owner(&self) -> AccessSite {
        self.owner
    }

    #[inline]
    pub(crate) fn is_resolved(&self) -> bool {
        self.resolved.get()
    }

    /// Relocation support: rebinds the core to a new identity and storage
    /// without changing its resolution state.
    pub(crate) fn rebind(&self, target: CellId, data: NonNull<()>) {
        self.target.set(target);
        self.data.set(data);
    }

    /// Transitions `Unresolved -> Resolved`, applying the conflict rule.
    /// Idempotent once resolved. Fatal on violation.
    pub(crate) fn resolve(&self) {
        if self.resolved.get() {
            return;
        }
        let outcome = registry::with(|r| r.register(AccessorRef::new(self)));
        match outcome {
            Ok(()) => self.resolved.set(true),
            Err(violation) => violation.raise(),
        }
    }

    /// Typed pointer to the tracked value. Only meaningful once resolved.
    #[inline]
    pub(crate) fn value_ptr<T>(&self) -> *mut T {
        self.data.get().as_ptr().cast::<T>()
    }
}

impl Drop for AccessorCore {
    fn drop(&mut self) {
        if !self.resolved.get() {
            // Never registered; the registry was never told about us.
            return;
        }
        // No-op after thread-local teardown: the registry is discarded
        // without validation at thread end.
        if let Some(Err(violation)) = registry::try_with(|r| r.unregister(AccessorRef::new(self))) {
            violation.raise();
        }
    }
}

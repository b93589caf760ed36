//! Per-cell bookkeeping of currently resolved handles.

use core::ptr::NonNull;

use crate::accessor::{AccessMode, AccessorCore};
use crate::registry::CellId;
use crate::violation::{AccessSite, Violation};

/// Non-owning back-reference to a live accessor core.
///
/// The core is heap-pinned by its public handle, so the pointer stays valid
/// for as long as the accessor is registered: a resolved accessor always
/// unregisters itself before its core is freed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct AccessorRef(NonNull<AccessorCore>);

impl AccessorRef {
    pub(crate) fn new(core: &AccessorCore) -> Self {
        Self(NonNull::from(core))
    }

    /// # Safety
    ///
    /// The referenced accessor must still be alive. Holds for every member
    /// of a record: membership ends (via unregistration or a fatal
    /// violation) before the accessor's storage is released.
    pub(crate) unsafe fn as_core(&self) -> &AccessorCore {
        unsafe { self.0.as_ref() }
    }
}

/// The set of resolved readers and the at-most-one resolved writer for a
/// single cell.
///
/// Record invariant: `writer.is_some()` implies `readers.is_empty()`, and
/// vice versa. The record is created lazily when the first handle is
/// constructed against the cell and may be empty at any time.
#[derive(Default)]
pub(crate) struct AccessRecord {
    readers: Vec<AccessorRef>,
    writer: Option<AccessorRef>,
}

impl AccessRecord {
    pub(crate) fn is_empty(&self) -> bool {
        self.readers.is_empty() && self.writer.is_none()
    }

    pub(crate) fn reader_count(&self) -> usize {
        self.readers.len()
    }

    pub(crate) fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    /// Owner tags of the live readers, in registration order.
    pub(crate) fn reader_sites(&self) -> Vec<AccessSite> {
        // SAFETY: members are live, see `AccessorRef::core`.
        self.readers.iter().map(|r| unsafe { r.as_core() }.owner()).collect()
    }

    /// Owner tag of the live writer, if one is registered.
    pub(crate) fn writer_site(&self) -> Option<AccessSite> {
        // SAFETY: members are live, see `AccessorRef::core`.
        self.writer.map(|w| unsafe { w.as_core() }.owner())
    }

    /// Applies the conflict rule and attaches the accessor on success.
    ///
    /// Evaluated strictly at resolution time; the returned `Violation` is
    /// raised by the caller once the registry borrow is released.
    pub(crate) fn admit(&mut self, accessor: AccessorRef) -> Result<(), Violation> {
        // SAFETY: `accessor` is the core currently being resolved.
        let core = unsafe { accessor.as_core() };

        if self.writer.is_some() && !self.readers.is_empty() {
            return Err(Violation::InvariantBroken {
                attempted: Some(core.owner()),
                detail: "record holds both a writer and readers",
            });
        }

        match core.mode() {
            AccessMode::Write => {
                if !self.readers.is_empty() {
                    return Err(Violation::WriteWhileRead {
                        attempted: core.owner(),
                        readers: self.reader_sites(),
                    });
                }
                if self.writer.is_some() {
                    // A second exclusive writer reaching the record is graded
                    // as severely as a bookkeeping defect.
                    return Err(Violation::InvariantBroken {
                        attempted: Some(core.owner()),
                        detail: "exclusive writer already registered",
                    });
                }
                self.writer = Some(accessor);
            }
            AccessMode::Read => {
                if let Some(writer) = self.writer_site() {
                    return Err(Violation::ReadWhileWrite {
                        attempted: core.owner(),
                        writer,
                    });
                }
                self.readers.push(accessor);
            }
        }

        Ok(())
    }

    /// Detaches a previously admitted accessor. Returns `false` if it was
    /// not a member, which only a defect in the tracking mechanism can
    /// produce.
    pub(crate) fn detach(&mut self, accessor: AccessorRef) -> bool {
        if self.writer == Some(accessor) {
            self.writer = None;
            return true;
        }
        if let Some(position) = self.readers.iter().position(|r| *r == accessor) {
            // Preserve registration order for diagnostics.
            self.readers.remove(position);
            return true;
        }
        false
    }

    /// Rewrites every member's target binding in place, without touching
    /// the record's composition. Part of the relocation protocol.
    pub(crate) fn retarget(&self, id: CellId, data: NonNull<()>) {
        for member in self.readers.iter().chain(self.writer.iter()) {
            // SAFETY: members are live, see `AccessorRef::core`.
            let core = unsafe { member.as_core() };
            core.rebind(id, data);
        }
    }
}

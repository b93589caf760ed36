//! # `warden` - Runtime Ownership Enforcement
//!
//! A debugging/verification layer that enforces the exclusive-writer /
//! shared-readers discipline at runtime, for access patterns the
//! compile-time borrow checker cannot see. A [`Cell`] wraps a value;
//! [`ReadAccessor`] and [`WriteAccessor`] are transient handles that are
//! deliberately *not* lifetime-bound to the cell. If two live handles
//! violate the discipline, the process terminates with a diagnostic naming
//! the conflicting call sites - silent aliasing bugs become loud.
//!
//! This is instrumentation for test and debug builds, not a production
//! concurrency primitive.
//!
//! ## Enforcement Model
//!
//! - **Lazy resolution**: a handle registers against its cell's access
//!   record on first use, which is where the conflict rule runs. A handle
//!   that is never used never registers. The `aggressive` feature moves
//!   resolution to construction.
//! - **Exclusive writer, shared readers**: any number of resolved read
//!   handles may coexist; a write handle resolves only into an empty
//!   record.
//! - **Crash as contract**: a violation is a bug in the calling code. The
//!   report goes to stderr and the process aborts - no error values, no
//!   recovery path.
//! - **Per-thread tracking**: each thread owns an independent registry.
//!   Cross-thread races are outside this tool's detection capability.
//!
//! ## Identity and Relocation
//!
//! Cells are tracked under stable, never-reused identities minted from a
//! per-thread counter - never under raw addresses. The tracked value can be
//! handed to fresh storage with [`Cell::relocate`] while handles are live:
//! the registry entry is re-keyed and every handle's binding is rewritten in
//! place, so conflict detection against the new identity behaves exactly
//! like detection against the original.
//!
//! ## Example
//!
//! ```
//! use warden::{Cell, ReadAccessor, WriteAccessor};
//!
//! let cell = Cell::new(0);
//!
//! {
//!     let reader = ReadAccessor::new(&cell);
//!     assert_eq!(reader.read(), 0);
//! } // reader drops here, releasing its registration
//!
//! let mut writer = WriteAccessor::new(&cell);
//! writer.write(1);
//! assert_eq!(writer.read(), 1);
//! ```
//!
//! Overlapping the two instead - keeping the reader live while the writer
//! resolves - prints a diagnostic naming both construction sites and aborts
//! the process.

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod accessor;
pub mod cell;
pub mod registry;
pub mod violation;

pub use accessor::{AccessMode, ReadAccessor, WriteAccessor};
pub use cell::Cell;
pub use registry::{CellId, RecordSnapshot};
pub use violation::{AccessSite, Violation};

// Compile-time layout claims. Handles are a single boxed pointer; the cell
// is its identity plus the slot pointer. Loose upper bounds to avoid
// platform brittleness.
const _: () = {
    use core::mem;

    assert!(mem::size_of::<ReadAccessor<u64>>() == mem::size_of::<usize>());
    assert!(mem::size_of::<WriteAccessor<u64>>() == mem::size_of::<usize>());
    assert!(mem::size_of::<Cell<u64>>() <= mem::size_of::<u64>() + mem::size_of::<usize>() * 2);
};

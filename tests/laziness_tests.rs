//! Resolution-lifecycle tests: handles register on first use, not at
//! construction, and unregister exactly when they resolved.
//!
//! These tests observe record composition through the inspection API; they
//! assume the default (lazy) resolution mode and are meaningless with the
//! `aggressive` feature enabled.

#![cfg(not(feature = "aggressive"))]

use warden::{registry, Cell, ReadAccessor, WriteAccessor};

#[test]
fn construction_does_not_register() {
    let cell = Cell::new(1);

    let reader = ReadAccessor::new(&cell);
    let writer = WriteAccessor::new(&cell);

    assert!(!reader.is_resolved());
    assert!(!writer.is_resolved());
    assert_eq!(cell.live_readers(), 0);
    assert!(!cell.has_writer());
}

#[test]
fn construction_creates_an_empty_record() {
    let cell = Cell::new(1);
    assert!(registry::snapshot(cell.id()).is_none());

    let _reader = ReadAccessor::new(&cell);
    let snapshot = registry::snapshot(cell.id()).expect("record exists once a handle does");
    assert!(snapshot.is_empty());
}

#[test]
fn first_access_resolves() {
    let cell = Cell::new(7);

    let reader = ReadAccessor::new(&cell);
    assert_eq!(cell.live_readers(), 0);

    assert_eq!(reader.read(), 7);
    assert!(reader.is_resolved());
    assert_eq!(cell.live_readers(), 1);

    // Resolution is idempotent.
    assert_eq!(reader.read(), 7);
    assert_eq!(cell.live_readers(), 1);
}

#[test]
fn unused_handles_never_touch_the_record() {
    let cell = Cell::new(0u32);

    // A stress of construct/destroy cycles with no access calls.
    for _ in 0..1000 {
        let reader = ReadAccessor::new(&cell);
        let writer = WriteAccessor::new(&cell);
        drop(reader);
        drop(writer);
    }

    let snapshot = registry::snapshot(cell.id()).expect("record exists");
    assert!(snapshot.is_empty());
}

#[test]
fn unused_write_handle_permits_later_readers() {
    let cell = Cell::new(3);

    // Constructed but never used: contributes nothing to the record, so
    // overlapping readers are fine.
    let _writer = WriteAccessor::new(&cell);

    let reader = ReadAccessor::new(&cell);
    assert_eq!(reader.read(), 3);
}

#[test]
fn drop_unregisters_resolved_handles() {
    let cell = Cell::new(9);

    {
        let a = ReadAccessor::new(&cell);
        let b = ReadAccessor::new(&cell);
        assert_eq!(a.read(), 9);
        assert_eq!(b.read(), 9);
        assert_eq!(cell.live_readers(), 2);
    }
    assert_eq!(cell.live_readers(), 0);

    {
        let mut writer = WriteAccessor::new(&cell);
        writer.write(10);
        assert!(cell.has_writer());
    }
    assert!(!cell.has_writer());
}

#[test]
fn cloned_reader_starts_unresolved() {
    let cell = Cell::new(5);

    let original = ReadAccessor::new(&cell);
    assert_eq!(original.read(), 5);

    let clone = original.clone();
    assert!(!clone.is_resolved());
    assert_eq!(cell.live_readers(), 1);

    assert_eq!(clone.read(), 5);
    assert_eq!(cell.live_readers(), 2);

    // The clone carries its own owner tag.
    assert_ne!(original.owner(), clone.owner());
}

#[test]
fn snapshot_reports_sites_in_registration_order() {
    let cell = Cell::new(1);

    let first = ReadAccessor::new(&cell);
    let second = ReadAccessor::new(&cell);
    let _ = first.read();
    let _ = second.read();

    let snapshot = registry::snapshot(cell.id()).expect("record exists");
    assert_eq!(snapshot.readers, vec![first.owner(), second.owner()]);
    assert_eq!(snapshot.writer, None);
}

#[test]
fn cell_drop_releases_the_record() {
    let id = {
        let cell = Cell::new(4);
        let _reader = ReadAccessor::new(&cell);
        assert!(registry::is_tracked(cell.id()));
        cell.id()
    };
    assert!(!registry::is_tracked(id));
}

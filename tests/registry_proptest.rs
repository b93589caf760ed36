//! Property tests: the registry's observable record composition always
//! matches a reference model of the handle lifecycle.

#![cfg(not(feature = "aggressive"))]

use proptest::prelude::*;
use warden::{registry, Cell, ReadAccessor, WriteAccessor};

#[derive(Debug, Clone)]
enum ReaderOp {
    /// Construct a fresh (unresolved) read handle.
    Spawn,
    /// Resolve the handle at `index % len` by reading through it.
    Resolve(usize),
    /// Drop the handle at `index % len`.
    Release(usize),
    /// Clone the handle at `index % len`; the clone starts unresolved.
    Duplicate(usize),
    /// Transfer the cell to a fresh identity. Applied only when every live
    /// handle is resolved, since unresolved handles do not survive a
    /// transfer.
    Relocate,
}

fn reader_op() -> impl Strategy<Value = ReaderOp> {
    prop_oneof![
        Just(ReaderOp::Spawn),
        any::<usize>().prop_map(ReaderOp::Resolve),
        any::<usize>().prop_map(ReaderOp::Release),
        any::<usize>().prop_map(ReaderOp::Duplicate),
        Just(ReaderOp::Relocate),
    ]
}

proptest! {
    #[test]
    fn reader_lifecycle_matches_model(ops in proptest::collection::vec(reader_op(), 1..200)) {
        let mut cell = Cell::new(77u32);
        let mut handles: Vec<ReadAccessor<u32>> = Vec::new();
        let mut resolved_model = 0usize;

        for op in ops {
            match op {
                ReaderOp::Spawn => {
                    handles.push(ReadAccessor::new(&cell));
                }
                ReaderOp::Resolve(index) => {
                    if !handles.is_empty() {
                        let handle = &handles[index % handles.len()];
                        if !handle.is_resolved() {
                            resolved_model += 1;
                        }
                        prop_assert_eq!(handle.read(), 77);
                    }
                }
                ReaderOp::Release(index) => {
                    if !handles.is_empty() {
                        let index = index % handles.len();
                        if handles[index].is_resolved() {
                            resolved_model -= 1;
                        }
                        handles.remove(index);
                    }
                }
                ReaderOp::Duplicate(index) => {
                    if !handles.is_empty() {
                        let clone = handles[index % handles.len()].clone();
                        prop_assert!(!clone.is_resolved());
                        handles.push(clone);
                    }
                }
                ReaderOp::Relocate => {
                    if handles.iter().all(ReadAccessor::is_resolved) {
                        let old_id = cell.id();
                        cell = cell.relocate();
                        prop_assert!(!registry::is_tracked(old_id));
                    }
                }
            }

            prop_assert_eq!(cell.live_readers(), resolved_model);
            prop_assert!(!cell.has_writer());
        }

        // Handles drop before the cell, releasing every registration.
        drop(handles);
        prop_assert_eq!(cell.live_readers(), 0);
    }

    #[test]
    fn alternating_exclusive_and_shared_phases(values in proptest::collection::vec(any::<u32>(), 1..50)) {
        let cell = Cell::new(0u32);

        for value in values {
            {
                let mut writer = WriteAccessor::new(&cell);
                writer.write(value);
                prop_assert!(cell.has_writer());
            }
            prop_assert!(!cell.has_writer());

            let readers: Vec<ReadAccessor<u32>> =
                (0..3).map(|_| ReadAccessor::new(&cell)).collect();
            for reader in &readers {
                prop_assert_eq!(reader.read(), value);
            }
            prop_assert_eq!(cell.live_readers(), 3);
        }
    }

    #[test]
    fn identities_are_never_reused(count in 1usize..100) {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..count {
            let cell = Cell::new(0u8);
            prop_assert!(seen.insert(cell.id()));
            let relocated = cell.relocate();
            prop_assert!(seen.insert(relocated.id()));
        }
    }
}

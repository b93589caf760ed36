//! Transferring a tracked value to a fresh identity while handles are live.
//!
//! Run with: `cargo run --example relocation`

use warden::{registry, Cell, ReadAccessor};

fn main() {
    let cell = Cell::new(vec![1, 2, 3]);
    let old_id = cell.id();

    let reader = ReadAccessor::new(&cell);
    println!("reader sees {:?} via {}", reader.get(), old_id);

    // Hand the value to a new cell. The reader stays attached: its binding
    // is rewritten in place, without unregistering or re-registering.
    let relocated = cell.relocate();

    println!("old identity {} tracked: {}", old_id, registry::is_tracked(old_id));
    println!(
        "new identity {} readers: {}",
        relocated.id(),
        relocated.live_readers()
    );
    println!("reader still sees {:?}", reader.get());

    // Release the handle before the cell goes away; destroying a cell with
    // live handles is itself a detected violation.
    drop(reader);
}

//! Demonstrates the fatal path: this program aborts with a diagnostic
//! naming both conflicting call sites.
//!
//! Run with: `cargo run --example violation`

use warden::{Cell, ReadAccessor, WriteAccessor};

fn main() {
    let cell = Cell::new(0);

    let reader = ReadAccessor::new(&cell);
    println!("reader sees {}", reader.read());

    // `reader` is still live and resolved, so this write is a detected
    // ownership violation: the process prints a report and aborts.
    let mut writer = WriteAccessor::new(&cell);
    writer.write(1);

    unreachable!("the violation above is fatal");
}

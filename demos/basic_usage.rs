//! Tour of tracked cells and access handles.
//!
//! Run with: `cargo run --example basic_usage`

use warden::{Cell, ReadAccessor, WriteAccessor};

fn main() {
    // A tracked cell owns its value; handles are how you touch it.
    let config = Cell::new(String::from("threads=4"));

    // Any number of read handles may overlap.
    let a = ReadAccessor::new(&config);
    let b = a.clone();
    println!("a sees: {}", a.get());
    println!("b sees: {}", b.get());
    println!("live readers: {}", config.live_readers());

    // Handles release their registration on drop; exclusive access is fine
    // once the readers are gone.
    drop(a);
    drop(b);

    let mut writer = WriteAccessor::new(&config);
    writer.write(String::from("threads=8"));
    println!("after write: {}", writer.get());
    drop(writer);

    // Handles resolve lazily: constructing one is free until first use.
    let untouched = WriteAccessor::new(&config);
    println!("untouched writer resolved: {}", untouched.is_resolved());
    drop(untouched);

    println!("final value: {}", config.into_inner());
}

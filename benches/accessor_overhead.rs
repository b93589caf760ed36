//! Measures the instrumentation overhead of tracked access against
//! `std::cell::RefCell`, the closest standard-library runtime-checked
//! primitive. The point of these numbers is honesty about cost: this is a
//! debugging layer, and the registry round-trip per resolution is expected
//! to lose to `RefCell`'s flag check.

use std::cell::RefCell;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use warden::{Cell, ReadAccessor, WriteAccessor};

fn bench_resolved_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolved_read");

    group.bench_function("warden", |b| {
        let cell = Cell::new(42u64);
        let reader = ReadAccessor::new(&cell);
        let _ = reader.read(); // resolve outside the hot loop
        b.iter(|| black_box(*reader.get()));
    });

    group.bench_function("refcell", |b| {
        let cell = RefCell::new(42u64);
        b.iter(|| black_box(*cell.borrow()));
    });

    group.finish();
}

fn bench_handle_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_lifecycle");

    group.bench_function("construct_resolve_drop", |b| {
        let cell = Cell::new(42u64);
        b.iter(|| {
            let reader = ReadAccessor::new(&cell);
            black_box(reader.read())
        });
    });

    group.bench_function("construct_drop_unresolved", |b| {
        let cell = Cell::new(42u64);
        b.iter(|| {
            let reader = ReadAccessor::new(&cell);
            black_box(&reader);
        });
    });

    group.bench_function("refcell_borrow_drop", |b| {
        let cell = RefCell::new(42u64);
        b.iter(|| {
            let borrow = cell.borrow();
            black_box(*borrow)
        });
    });

    group.finish();
}

fn bench_write_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");

    group.bench_function("warden", |b| {
        let cell = Cell::new(0u64);
        b.iter(|| {
            let mut writer = WriteAccessor::new(&cell);
            writer.write(black_box(7));
        });
    });

    group.bench_function("refcell", |b| {
        let cell = RefCell::new(0u64);
        b.iter(|| {
            *cell.borrow_mut() = black_box(7);
        });
    });

    group.finish();
}

fn bench_relocation(c: &mut Criterion) {
    c.bench_function("relocate_with_live_reader", |b| {
        b.iter(|| {
            let cell = Cell::new(42u64);
            let reader = ReadAccessor::new(&cell);
            let _ = reader.read();
            let relocated = cell.relocate();
            black_box(reader.read());
            drop(reader);
            relocated
        });
    });
}

criterion_group!(
    benches,
    bench_resolved_reads,
    bench_handle_lifecycle,
    bench_write_path,
    bench_relocation
);
criterion_main!(benches);

use alloc::format;
use alloc::vec;
use core::hint::black_box;

use criterion::Criterion;

use crate::{BatchedFn, LookupFn, random_bytes, random_table};

/// Benchmark one single-row kernel at row length `n`.
pub fn benchmark_lookup(c: &mut Criterion, name: &str, lookup: LookupFn, n: usize) {
    let table = random_table(0x0123456789abcdef);
    let x = random_bytes(n, n as u64);
    let mut y = vec![0u8; n];
    c.bench_function(&format!("{} lookup/{}", name, n), |b| {
        b.iter(|| lookup(black_box(&table), black_box(&x), black_box(&mut y)))
    });
}

/// Benchmark one batched kernel over an `m`×`n` matrix at a shared row
/// stride `ld` for source and destination.
pub fn benchmark_lookup_batched(
    c: &mut Criterion,
    name: &str,
    batched: BatchedFn,
    m: usize,
    n: usize,
    ld: usize,
) {
    assert!(ld >= n);
    let len = (m - 1) * ld + n;
    let table = random_table(0xfedcba9876543210);
    let x = random_bytes(len, (m * n) as u64);
    let mut y = vec![0u8; len];
    c.bench_function(&format!("{} lookup_batched/{}x{} ld {}", name, m, n, ld), |b| {
        b.iter(|| {
            batched(
                black_box(&table),
                m,
                n,
                black_box(&x),
                ld,
                black_box(&mut y),
                ld,
            )
        })
    });
}

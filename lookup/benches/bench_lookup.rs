use criterion::{Criterion, criterion_group, criterion_main};
use qk_lookup_testing::bench_func::{benchmark_lookup, benchmark_lookup_batched};

fn bench_lookup_kernels(c: &mut Criterion) {
    // 1000 is deliberately not a multiple of the vector width, so the tail
    // path shows up in the profile.
    for &n in &[64usize, 1000, 4096, 1 << 16] {
        benchmark_lookup(c, "scalar", qk_lookup::scalar::lookup, n);
        benchmark_lookup(c, "selected", qk_lookup::lookup, n);
    }

    benchmark_lookup_batched(c, "scalar", qk_lookup::scalar::lookup_batched, 64, 1000, 1024);
    benchmark_lookup_batched(c, "selected", qk_lookup::lookup_batched, 64, 1000, 1024);
}

criterion_group!(lookup_kernels, bench_lookup_kernels);
criterion_main!(lookup_kernels);

//! Utilities for testing table-lookup kernel implementations.
//!
//! Every kernel exposes the same two entry points, so the whole suite is
//! parameterized by function pointers and shared between the scalar
//! reference and the per-architecture kernels via [`test_lookup_kernel!`].

#![no_std]

extern crate alloc;

pub mod bench_func;

use alloc::vec;
use alloc::vec::Vec;

use qk_lookup::{LookupTable, scalar};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Single-row entry point: `lookup(table, x, y)`.
pub type LookupFn = fn(&LookupTable, &[u8], &mut [u8]);

/// Batched entry point: `lookup_batched(table, m, n, x, ldx, y, ldy)`.
pub type BatchedFn = fn(&LookupTable, usize, usize, &[u8], usize, &mut [u8], usize);

/// Row lengths covering every remainder class mod 16 and mod 4, the vector
/// width boundaries, and one size large enough for many full iterations.
pub const TEST_SIZES: &[usize] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 32, 33, 63, 64, 65, 4096,
];

pub fn random_table(seed: u64) -> LookupTable {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut table = [0u8; 256];
    rng.fill(&mut table[..]);
    table
}

pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut bytes = vec![0u8; len];
    rng.fill(bytes.as_mut_slice());
    bytes
}

/// The kernel under test must match the scalar reference byte-for-byte on
/// random tables across the whole size grid.
pub fn test_matches_scalar(lookup: LookupFn) {
    for (i, &n) in TEST_SIZES.iter().enumerate() {
        let table = random_table(0x9e3779b97f4a7c15 ^ i as u64);
        let x = random_bytes(n, 0x2545f4914f6cdd1d ^ n as u64);

        let mut want = vec![0u8; n];
        scalar::lookup(&table, &x, &mut want);

        let mut got = vec![0u8; n];
        lookup(&table, &x, &mut got);

        assert_eq!(got, want, "Mismatch with the scalar reference at n = {n}.");
    }
}

/// An input holding every possible byte value exercises all four 64-entry
/// table groups, including the group boundaries.
pub fn test_covers_full_domain(lookup: LookupFn) {
    let table = random_table(0xd1b54a32d192ed03);
    let x: Vec<u8> = (0..=255).collect();

    let mut want = vec![0u8; 256];
    scalar::lookup(&table, &x, &mut want);

    let mut got = vec![0u8; 256];
    lookup(&table, &x, &mut got);

    assert_eq!(got, want, "Mismatch on the input covering all byte values.");
}

/// With `table[i] == i` the transform is the identity for any input.
pub fn test_identity_table(lookup: LookupFn) {
    let table: LookupTable = core::array::from_fn(|i| i as u8);
    for &n in TEST_SIZES {
        let x = random_bytes(n, 0x94d049bb133111eb ^ n as u64);
        let mut y = vec![0u8; n];
        lookup(&table, &x, &mut y);
        assert_eq!(y, x, "Identity table was not the identity at n = {n}.");
    }
}

/// With `table[i] == c` every output byte is `c` regardless of input.
pub fn test_constant_table(lookup: LookupFn) {
    const C: u8 = 0xab;
    let table = [C; 256];
    for &n in TEST_SIZES {
        let x = random_bytes(n, 0xbf58476d1ce4e5b9 ^ n as u64);
        let mut y = vec![0u8; n];
        lookup(&table, &x, &mut y);
        assert!(
            y.iter().all(|&b| b == C),
            "Constant table produced a non-constant output at n = {n}."
        );
    }
}

/// The complement table `table[i] = 255 - i` on a known input.
pub fn test_complement_table(lookup: LookupFn) {
    let table: LookupTable = core::array::from_fn(|i| 255 - i as u8);
    let x = [0u8, 128, 255, 10];
    let mut y = [0u8; 4];
    lookup(&table, &x, &mut y);
    assert_eq!(y, [255, 127, 0, 245]);
}

/// Batched over M=3, N=5, ldx=8, ldy=5 equals three independent single-row
/// calls on the strided source rows, packed contiguously in the destination.
pub fn test_batched_matches_single_rows(batched: BatchedFn, lookup: LookupFn) {
    const M: usize = 3;
    const N: usize = 5;
    const LDX: usize = 8;
    const LDY: usize = 5;

    let table = random_table(0x6c62272e07bb0142);
    let x = random_bytes((M - 1) * LDX + N, 0x27d4eb2f165667c5);

    let mut y = vec![0u8; (M - 1) * LDY + N];
    batched(&table, M, N, &x, LDX, &mut y, LDY);

    for i in 0..M {
        let mut want = vec![0u8; N];
        lookup(&table, &x[i * LDX..][..N], &mut want);
        assert_eq!(&y[i * LDY..][..N], want, "Row {i} differs.");
    }
}

/// With `ldx == ldy == n` the batched form degenerates to one flat row.
pub fn test_batched_contiguous(batched: BatchedFn, lookup: LookupFn) {
    const M: usize = 4;
    const N: usize = 7;

    let table = random_table(0x853c49e6748fea9b);
    let x = random_bytes(M * N, 0xda3e39cb94b95bdb);

    let mut want = vec![0u8; M * N];
    lookup(&table, &x, &mut want);

    let mut got = vec![0u8; M * N];
    batched(&table, M, N, &x, N, &mut got, N);

    assert_eq!(got, want);
}

/// A source stride smaller than the row length makes rows overlap in the
/// source; each row must still match an independent single-row call.
pub fn test_batched_overlapping_rows(batched: BatchedFn, lookup: LookupFn) {
    const M: usize = 3;
    const N: usize = 5;
    const LDX: usize = 2;
    const LDY: usize = 5;

    let table = random_table(0xe7037ed1a0b428db);
    let x = random_bytes((M - 1) * LDX + N, 0x8ebc6af09c88c6e3);

    let mut y = vec![0u8; M * N];
    batched(&table, M, N, &x, LDX, &mut y, LDY);

    for i in 0..M {
        let mut want = vec![0u8; N];
        lookup(&table, &x[i * LDX..][..N], &mut want);
        assert_eq!(&y[i * LDY..][..N], want, "Overlapping-source row {i} differs.");
    }
}

/// A destination stride larger than the row length leaves the bytes in the
/// gap between consecutive rows untouched.
pub fn test_batched_stride_gap(batched: BatchedFn) {
    const M: usize = 3;
    const N: usize = 5;
    const LDX: usize = 6;
    const LDY: usize = 9;
    const SENTINEL: u8 = 0xee;

    let table = random_table(0x589965cc75374cc3);
    let x = random_bytes((M - 1) * LDX + N, 0x1b03738712fad5c9);

    let mut y = vec![SENTINEL; (M - 1) * LDY + N];
    batched(&table, M, N, &x, LDX, &mut y, LDY);

    for i in 0..M - 1 {
        assert!(
            y[i * LDY + N..(i + 1) * LDY].iter().all(|&b| b == SENTINEL),
            "Stride gap after row {i} was written."
        );
    }
}

/// `m == 0` and `n == 0` are valid no-ops, even on empty buffers.
pub fn test_batched_empty(batched: BatchedFn) {
    let table = random_table(0x2bf67f3a1d55056f);

    batched(&table, 0, 5, &[], 8, &mut [], 5);
    batched(&table, 3, 0, &[], 8, &mut [], 5);

    const SENTINEL: u8 = 0x5a;
    let x = [0u8; 16];
    let mut y = [SENTINEL; 16];
    batched(&table, 4, 0, &x, 4, &mut y, 4);
    assert!(y.iter().all(|&b| b == SENTINEL));
}

/// Expands to `#[test]` functions running the whole suite against one
/// kernel's `lookup`/`lookup_batched` pair.
#[macro_export]
macro_rules! test_lookup_kernel {
    ($lookup:path, $lookup_batched:path) => {
        #[test]
        fn matches_scalar_reference() {
            $crate::test_matches_scalar($lookup);
        }

        #[test]
        fn covers_full_byte_domain() {
            $crate::test_covers_full_domain($lookup);
        }

        #[test]
        fn identity_table_is_identity() {
            $crate::test_identity_table($lookup);
        }

        #[test]
        fn constant_table_is_constant() {
            $crate::test_constant_table($lookup);
        }

        #[test]
        fn complement_table_example() {
            $crate::test_complement_table($lookup);
        }

        #[test]
        fn batched_matches_single_rows() {
            $crate::test_batched_matches_single_rows($lookup_batched, $lookup);
        }

        #[test]
        fn batched_contiguous_equals_flat() {
            $crate::test_batched_contiguous($lookup_batched, $lookup);
        }

        #[test]
        fn batched_overlapping_source_rows() {
            $crate::test_batched_overlapping_rows($lookup_batched, $lookup);
        }

        #[test]
        fn batched_stride_gap_untouched() {
            $crate::test_batched_stride_gap($lookup_batched);
        }

        #[test]
        fn batched_zero_rows_and_cols() {
            $crate::test_batched_empty($lookup_batched);
        }
    };
}

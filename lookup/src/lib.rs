//! Byte-to-byte table-lookup kernels for quantized elementwise operators.
//!
//! A quantized activation (or any other elementwise function over `u8`)
//! reduces to a gather through a precomputed 256-entry table:
//! `y[i] = table[x[i]]`. This crate provides that transform for single rows
//! and for row-strided matrices, with a portable scalar kernel and
//! vectorized kernels selected at compile time by target architecture. All
//! kernels are bit-for-bit equivalent; only throughput differs.
//!
//! The kernels allocate nothing, hold no state between calls, and are safe
//! to run concurrently against a shared table.

#![no_std]

pub mod scalar;

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
pub mod aarch64_neon;

#[cfg(all(
    target_arch = "x86_64",
    target_feature = "avx512vbmi",
    target_feature = "avx512bw"
))]
pub mod x86_64_avx512;

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
use aarch64_neon as kernel;
#[cfg(all(
    target_arch = "x86_64",
    target_feature = "avx512vbmi",
    target_feature = "avx512bw"
))]
use x86_64_avx512 as kernel;
#[cfg(not(any(
    all(target_arch = "aarch64", target_feature = "neon"),
    all(
        target_arch = "x86_64",
        target_feature = "avx512vbmi",
        target_feature = "avx512bw"
    )
)))]
use scalar as kernel;

/// A total mapping from every `u8` value to a `u8` value.
///
/// Callers own the table; the kernels only read it for the duration of a
/// call. How the 256 entries are computed (activation quantization etc.) is
/// outside this crate.
pub type LookupTable = [u8; 256];

/// Transform one row: `y[i] = table[x[i]]` for every position.
///
/// # Panics
///
/// Panics if `x` and `y` differ in length.
#[inline]
pub fn lookup(table: &LookupTable, x: &[u8], y: &mut [u8]) {
    assert_eq!(
        x.len(),
        y.len(),
        "lookup source and destination lengths differ"
    );
    kernel::lookup(table, x, y);
}

/// Transform an `m`×`n` matrix embedded in larger buffers at row strides
/// `ldx` (source) and `ldy` (destination), both in elements: source row `i`
/// starts at `x[i * ldx]` and destination row `i` at `y[i * ldy]`.
///
/// Rows are processed strictly in order with no cross-row state, so strides
/// smaller than `n` (overlapping rows) are permitted when that is the
/// caller's intent. `m == 0` or `n == 0` is a no-op. Bytes in the stride gap
/// between destination rows are left untouched.
///
/// # Panics
///
/// Panics if either buffer does not cover its addressed region, i.e. is
/// shorter than `(m - 1) * ld + n` elements.
#[inline]
pub fn lookup_batched(
    table: &LookupTable,
    m: usize,
    n: usize,
    x: &[u8],
    ldx: usize,
    y: &mut [u8],
    ldy: usize,
) {
    if m == 0 || n == 0 {
        return;
    }
    assert!(
        covered_span(m, n, ldx).is_some_and(|len| x.len() >= len),
        "lookup_batched source does not cover m rows at stride ldx"
    );
    assert!(
        covered_span(m, n, ldy).is_some_and(|len| y.len() >= len),
        "lookup_batched destination does not cover m rows at stride ldy"
    );
    kernel::lookup_batched(table, m, n, x, ldx, y, ldy);
}

/// Elements a buffer must hold to cover `m` rows of length `n` at stride
/// `ld`. `None` when the span overflows `usize`, which no real buffer can
/// satisfy. Callers have already rejected `m == 0`.
#[inline]
fn covered_span(m: usize, n: usize, ld: usize) -> Option<usize> {
    (m - 1).checked_mul(ld)?.checked_add(n)
}

#[cfg(test)]
mod tests {
    use qk_lookup_testing::test_lookup_kernel;

    test_lookup_kernel!(crate::lookup, crate::lookup_batched);

    #[test]
    #[should_panic(expected = "lengths differ")]
    fn mismatched_row_lengths_panic() {
        let table = [0u8; 256];
        let x = [1u8, 2, 3];
        let mut y = [0u8; 2];
        crate::lookup(&table, &x, &mut y);
    }

    #[test]
    #[should_panic(expected = "source does not cover")]
    fn batched_short_source_panics() {
        let table = [0u8; 256];
        // Three rows of five at stride eight need 21 source bytes.
        let x = [0u8; 20];
        let mut y = [0u8; 15];
        crate::lookup_batched(&table, 3, 5, &x, 8, &mut y, 5);
    }

    #[test]
    #[should_panic(expected = "source does not cover")]
    fn batched_wrapping_stride_panics() {
        let table = [0u8; 256];
        let x = [0u8; 21];
        let mut y = [0u8; 15];
        // (m - 1) * ldx wraps around usize; the guard must still reject it
        // rather than let the row loop panic later.
        crate::lookup_batched(&table, 3, 5, &x, usize::MAX / 2 + 1, &mut y, 5);
    }

    #[test]
    #[should_panic(expected = "destination does not cover")]
    fn batched_short_destination_panics() {
        let table = [0u8; 256];
        let x = [0u8; 21];
        let mut y = [0u8; 14];
        crate::lookup_batched(&table, 3, 5, &x, 8, &mut y, 5);
    }
}

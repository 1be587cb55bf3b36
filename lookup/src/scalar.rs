//! Portable scalar rendition of the table-lookup transform.
//!
//! This is the semantic reference: every vectorized kernel must produce
//! output identical to this one for all 256 possible byte values.

use crate::LookupTable;

/// Transform one row: `y[i] = table[x[i]]`.
///
/// The gather is total over the `u8` domain, so there is no miss case and the
/// indexing needs no bounds check. Four elements per iteration to cut loop
/// overhead; the compiler interleaves the independent loads.
#[inline]
pub fn lookup(table: &LookupTable, x: &[u8], y: &mut [u8]) {
    debug_assert_eq!(x.len(), y.len());

    let mut x_chunks = x.chunks_exact(4);
    let mut y_chunks = y.chunks_exact_mut(4);
    for (xs, ys) in (&mut x_chunks).zip(&mut y_chunks) {
        ys[0] = table[xs[0] as usize];
        ys[1] = table[xs[1] as usize];
        ys[2] = table[xs[2] as usize];
        ys[3] = table[xs[3] as usize];
    }
    for (&xv, yv) in x_chunks.remainder().iter().zip(y_chunks.into_remainder()) {
        *yv = table[xv as usize];
    }
}

/// Strided `m`×`n` form: row `i` of the source starts at `x[i * ldx]`, of the
/// destination at `y[i * ldy]`. Rows are processed in order.
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
    for i in 0..m {
        lookup(table, &x[i * ldx..][..n], &mut y[i * ldy..][..n]);
    }
}

#[cfg(test)]
mod tests {
    use qk_lookup_testing::test_lookup_kernel;

    test_lookup_kernel!(crate::scalar::lookup, crate::scalar::lookup_batched);
}

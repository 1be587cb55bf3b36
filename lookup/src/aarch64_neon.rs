//! Vectorized NEON rendition of the table-lookup transform.
//!
//! NEON's `tbl`/`tbx` family addresses at most 64 table bytes per
//! instruction, so the 256-entry table is held as four 64-entry register
//! groups and composed per lookup. See [`lookup16`] for the composition.

use core::arch::aarch64::{self, uint8x8_t, uint8x16_t, uint8x16x4_t};

use crate::LookupTable;

const WIDTH: usize = 16;

/// The 256-entry table as four 64-entry register groups; group `g` covers
/// entries `64 * g ..= 64 * g + 63`. Loaded once per entry call and reused
/// for every iteration (and, in the batched form, every row).
#[derive(Clone, Copy)]
struct TableVectors([uint8x16x4_t; 4]);

#[inline]
#[must_use]
fn load_group(table: &LookupTable, offset: usize) -> uint8x16x4_t {
    debug_assert!(offset <= 192 && offset % 64 == 0);
    unsafe {
        // Safety: If this code got compiled then NEON intrinsics are
        // available. `offset + 48 + 16 <= 256`, so all four loads stay
        // within the table.
        let p = table.as_ptr().add(offset);
        uint8x16x4_t(
            aarch64::vld1q_u8(p),
            aarch64::vld1q_u8(p.add(16)),
            aarch64::vld1q_u8(p.add(32)),
            aarch64::vld1q_u8(p.add(48)),
        )
    }
}

#[inline]
#[must_use]
fn load_table(table: &LookupTable) -> TableVectors {
    TableVectors([
        load_group(table, 0),
        load_group(table, 64),
        load_group(table, 128),
        load_group(table, 192),
    ])
}

/// Look up 16 indices in the full 256-entry table.
#[inline]
#[must_use]
fn lookup16(lut: &TableVectors, idx: uint8x16_t) -> uint8x16_t {
    // We want this to compile to:
    //      tbl   res.16b, {t0_0.16b - t0_3.16b}, idx.16b
    //      sub   i1.16b, idx.16b, v64.16b
    //      tbx   res.16b, {t1_0.16b - t1_3.16b}, i1.16b
    //      sub   i2.16b, idx.16b, v128.16b
    //      tbx   res.16b, {t2_0.16b - t2_3.16b}, i2.16b
    //      sub   i3.16b, i2.16b, v64.16b
    //      tbx   res.16b, {t3_0.16b - t3_3.16b}, i3.16b
    //
    // `tbl` zeroes lanes whose index is out of range (>= 64) and `tbx` leaves
    // them unchanged, so biasing the indices by 64/128/192 routes every lane
    // to exactly one group and the three `tbx` merges compose the full
    // 256-entry gather with no per-lane branch.
    unsafe {
        // Safety: If this code got compiled then NEON intrinsics are available.
        let TableVectors([t0, t1, t2, t3]) = *lut;
        let bias = aarch64::vdupq_n_u8(64);
        let idx_hi = aarch64::vsubq_u8(idx, aarch64::vdupq_n_u8(128));
        let mut res = aarch64::vqtbl4q_u8(t0, idx);
        res = aarch64::vqtbx4q_u8(res, t1, aarch64::vsubq_u8(idx, bias));
        res = aarch64::vqtbx4q_u8(res, t2, idx_hi);
        res = aarch64::vqtbx4q_u8(res, t3, aarch64::vsubq_u8(idx_hi, bias));
        res
    }
}

/// Transform one row with preloaded table registers.
#[inline]
fn lookup_row(lut: &TableVectors, x: &[u8], y: &mut [u8]) {
    debug_assert_eq!(x.len(), y.len());

    let mut n = x.len();
    unsafe {
        // Safety: the full-width loop reads and writes 16 bytes only while
        // `n >= WIDTH`; the remainder is handed to `lookup_tail`, which never
        // touches memory past `n` bytes.
        let mut xp = x.as_ptr();
        let mut yp = y.as_mut_ptr();
        while n >= WIDTH {
            let idx = aarch64::vld1q_u8(xp);
            aarch64::vst1q_u8(yp, lookup16(lut, idx));
            xp = xp.add(WIDTH);
            yp = yp.add(WIDTH);
            n -= WIDTH;
        }
        if n > 0 {
            lookup_tail(lut, xp, yp, n);
        }
    }
}

/// Transform the final `n` bytes of a row.
///
/// Safety: `x` must be valid for reads of `n` bytes, `y` for writes of `n`
/// bytes, with `0 < n < 16`.
unsafe fn lookup_tail(lut: &TableVectors, x: *const u8, y: *mut u8, n: usize) {
    // The remainder is staged through a zeroed 16-byte scratch buffer so the
    // full-width vector load cannot read past the source; the zero lanes get
    // transformed along with the rest but are never stored.
    let mut scratch = [0u8; WIDTH];
    unsafe {
        // Safety: `n < 16` bytes fit in `scratch`; the partial stores below
        // write exactly `n & 8 + n & 4 + n & 2 + n & 1 = n` bytes to `y`.
        // Lane order matches memory order on the little-endian aarch64
        // targets this module compiles for.
        core::ptr::copy_nonoverlapping(x, scratch.as_mut_ptr(), n);
        let res = lookup16(lut, aarch64::vld1q_u8(scratch.as_ptr()));

        let mut y = y;
        let mut v: uint8x8_t = aarch64::vget_low_u8(res);
        if n & 8 != 0 {
            aarch64::vst1_u8(y, v);
            y = y.add(8);
            v = aarch64::vget_high_u8(res);
        }
        if n & 4 != 0 {
            let half = aarch64::vget_lane_u32::<0>(aarch64::vreinterpret_u32_u8(v));
            y.cast::<u32>().write_unaligned(half);
            y = y.add(4);
            v = aarch64::vext_u8::<4>(v, v);
        }
        if n & 2 != 0 {
            let pair = aarch64::vget_lane_u16::<0>(aarch64::vreinterpret_u16_u8(v));
            y.cast::<u16>().write_unaligned(pair);
            y = y.add(2);
            v = aarch64::vext_u8::<2>(v, v);
        }
        if n & 1 != 0 {
            *y = aarch64::vget_lane_u8::<0>(v);
        }
    }
}

/// Transform one row: `y[i] = table[x[i]]`.
#[inline]
pub fn lookup(table: &LookupTable, x: &[u8], y: &mut [u8]) {
    let lut = load_table(table);
    lookup_row(&lut, x, y);
}

/// Strided `m`×`n` form. The table registers are loaded once, outside the row
/// loop, and reused for all `m` rows.
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
    let lut = load_table(table);
    for i in 0..m {
        lookup_row(&lut, &x[i * ldx..][..n], &mut y[i * ldy..][..n]);
    }
}

#[cfg(test)]
mod tests {
    use qk_lookup_testing::test_lookup_kernel;

    test_lookup_kernel!(
        crate::aarch64_neon::lookup,
        crate::aarch64_neon::lookup_batched
    );
}

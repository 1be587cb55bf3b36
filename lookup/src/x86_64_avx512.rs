//! Vectorized AVX-512 VBMI rendition of the table-lookup transform.
//!
//! `vpermi2b` is a native two-source byte permute over 128 table bytes, so
//! the 256-entry table needs only two permutes and a blend per 64 input
//! bytes. The tail uses this architecture's masked loads and stores instead
//! of a scratch buffer.

use core::arch::x86_64::{self, __m512i, __mmask64};

use crate::LookupTable;

const WIDTH: usize = 64;

/// The 256-entry table as four 64-byte registers; register `g` covers
/// entries `64 * g ..= 64 * g + 63`.
#[derive(Clone, Copy)]
struct TableVectors([__m512i; 4]);

#[inline]
#[must_use]
fn load_table(table: &LookupTable) -> TableVectors {
    unsafe {
        // Safety: If this code got compiled then AVX-512 intrinsics are
        // available. The table covers 256 bytes, so every 64-byte unaligned
        // load below is in bounds.
        let p = table.as_ptr();
        TableVectors([
            x86_64::_mm512_loadu_si512(p.cast()),
            x86_64::_mm512_loadu_si512(p.add(64).cast()),
            x86_64::_mm512_loadu_si512(p.add(128).cast()),
            x86_64::_mm512_loadu_si512(p.add(192).cast()),
        ])
    }
}

/// Look up 64 indices in the full 256-entry table.
#[inline]
#[must_use]
fn lookup64(lut: &TableVectors, idx: __m512i) -> __m512i {
    // We want this to compile to:
    //      vpermi2b  lo.zmm, t0.zmm, t1.zmm
    //      vpermi2b  hi.zmm, t2.zmm, t3.zmm
    //      vpmovb2m  k1, idx.zmm
    //      vpblendmb res.zmm{k1}, lo.zmm, hi.zmm
    //
    // `vpermi2b` reads index bits 6:0 and ignores bit 7, so one permute
    // covers entries 0..=127 and a second covers 128..=255 at `idx mod 128`;
    // the sign bit of each index lane selects between the two.
    unsafe {
        // Safety: If this code got compiled then AVX-512 VBMI/BW intrinsics
        // are available.
        let TableVectors([t0, t1, t2, t3]) = *lut;
        let lo = x86_64::_mm512_permutex2var_epi8(t0, idx, t1);
        let hi = x86_64::_mm512_permutex2var_epi8(t2, idx, t3);
        let high_half: __mmask64 = x86_64::_mm512_movepi8_mask(idx);
        x86_64::_mm512_mask_blend_epi8(high_half, lo, hi)
    }
}

/// Transform one row with preloaded table registers.
#[inline]
fn lookup_row(lut: &TableVectors, x: &[u8], y: &mut [u8]) {
    debug_assert_eq!(x.len(), y.len());

    let mut n = x.len();
    unsafe {
        // Safety: the full-width loop reads and writes 64 bytes only while
        // `n >= WIDTH`; the remainder uses masked memory operations that
        // touch exactly the first `n` lanes.
        let mut xp = x.as_ptr();
        let mut yp = y.as_mut_ptr();
        while n >= WIDTH {
            let idx = x86_64::_mm512_loadu_si512(xp.cast());
            x86_64::_mm512_storeu_si512(yp.cast(), lookup64(lut, idx));
            xp = xp.add(WIDTH);
            yp = yp.add(WIDTH);
            n -= WIDTH;
        }
        if n > 0 {
            // `n < 64`, so the shift cannot overflow. Masked lanes are
            // neither read nor written.
            let mask: __mmask64 = (1u64 << n) - 1;
            let idx = x86_64::_mm512_maskz_loadu_epi8(mask, xp.cast());
            x86_64::_mm512_mask_storeu_epi8(yp.cast(), mask, lookup64(lut, idx));
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
        crate::x86_64_avx512::lookup,
        crate::x86_64_avx512::lookup_batched
    );
}

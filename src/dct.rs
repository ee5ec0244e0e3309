//! Forward DCT (Discrete Cosine Transform) implementation.
//!
//! This implements the Loeffler-Ligtenberg-Moschytz algorithm for the 8x8
//! DCT with the same fixed-point precision as libjpeg's `jfdctint.c`
//! (integer slow DCT): 12 multiplies and 32 adds per 1-D pass, rows first,
//! then columns.
//!
//! The output is scaled up by a factor of 8 compared to a true DCT. The
//! quantizer folds that factor into its divisors.
//!
//! Reference: C. Loeffler, A. Ligtenberg and G. Moschytz,
//! "Practical Fast 1-D DCT Algorithms with 11 Multiplications",
//! Proc. ICASSP 1989, pp. 988-991.

use crate::consts::{DCTSIZE, DCTSIZE2};
use multiversion::multiversion;

const CONST_BITS: i32 = 13;
const PASS1_BITS: i32 = 2;

// FIX(x) = (x * (1 << CONST_BITS) + 0.5)
const FIX_0_298631336: i32 = 2446;
const FIX_0_390180644: i32 = 3196;
const FIX_0_541196100: i32 = 4433;
const FIX_0_765366865: i32 = 6270;
const FIX_0_899976223: i32 = 7373;
const FIX_1_175875602: i32 = 9633;
const FIX_1_501321110: i32 = 12299;
const FIX_1_847759065: i32 = 15137;
const FIX_1_961570560: i32 = 16069;
const FIX_2_053119869: i32 = 16819;
const FIX_2_562915447: i32 = 20995;
const FIX_3_072711026: i32 = 25172;

/// Right-shift with rounding.
#[inline]
fn descale(x: i32, n: i32) -> i32 {
    (x + (1 << (n - 1))) >> n
}

/// One 1-D pass over eight samples, returning outputs in frequency order.
///
/// The row pass keeps `PASS1_BITS` of extra precision; the column pass
/// removes it again, leaving the overall factor-of-8 scale.
#[inline(always)]
fn fdct_1d(d: [i32; DCTSIZE], row_pass: bool) -> [i32; DCTSIZE] {
    let (even_shift, odd_shift) = if row_pass {
        (0, CONST_BITS - PASS1_BITS)
    } else {
        (PASS1_BITS, CONST_BITS + PASS1_BITS)
    };
    let even = |x: i32| {
        if row_pass {
            x << PASS1_BITS
        } else {
            descale(x, even_shift)
        }
    };

    let tmp0 = d[0] + d[7];
    let tmp7 = d[0] - d[7];
    let tmp1 = d[1] + d[6];
    let tmp6 = d[1] - d[6];
    let tmp2 = d[2] + d[5];
    let tmp5 = d[2] - d[5];
    let tmp3 = d[3] + d[4];
    let tmp4 = d[3] - d[4];

    // Even part (Loeffler figure 1)
    let tmp10 = tmp0 + tmp3;
    let tmp13 = tmp0 - tmp3;
    let tmp11 = tmp1 + tmp2;
    let tmp12 = tmp1 - tmp2;

    let mut out = [0i32; DCTSIZE];
    out[0] = even(tmp10 + tmp11);
    out[4] = even(tmp10 - tmp11);

    let z1 = (tmp12 + tmp13) * FIX_0_541196100;
    out[2] = descale(z1 + tmp13 * FIX_0_765366865, odd_shift);
    out[6] = descale(z1 - tmp12 * FIX_1_847759065, odd_shift);

    // Odd part (Loeffler figure 8)
    let z1 = tmp4 + tmp7;
    let z2 = tmp5 + tmp6;
    let z3 = tmp4 + tmp6;
    let z4 = tmp5 + tmp7;
    let z5 = (z3 + z4) * FIX_1_175875602;

    let tmp4 = tmp4 * FIX_0_298631336;
    let tmp5 = tmp5 * FIX_2_053119869;
    let tmp6 = tmp6 * FIX_3_072711026;
    let tmp7 = tmp7 * FIX_1_501321110;
    let z1 = -z1 * FIX_0_899976223;
    let z2 = -z2 * FIX_2_562915447;
    let z3 = -z3 * FIX_1_961570560 + z5;
    let z4 = -z4 * FIX_0_390180644 + z5;

    out[7] = descale(tmp4 + z1 + z3, odd_shift);
    out[5] = descale(tmp5 + z2 + z4, odd_shift);
    out[3] = descale(tmp6 + z2 + z3, odd_shift);
    out[1] = descale(tmp7 + z1 + z4, odd_shift);
    out
}

/// Perform forward DCT on one level-shifted 8x8 block.
///
/// Input and output are row-major. Output is scaled by 8.
#[multiversion(targets(
    "x86_64+avx2",
    "x86_64+sse4.1",
    "x86+avx2",
    "x86+sse4.1",
    "aarch64+neon",
))]
pub fn forward_dct_8x8(samples: &[i16; DCTSIZE2], coeffs: &mut [i16; DCTSIZE2]) {
    let mut data = [0i32; DCTSIZE2];

    for row in 0..DCTSIZE {
        let base = row * DCTSIZE;
        let mut line = [0i32; DCTSIZE];
        for (dst, &src) in line.iter_mut().zip(&samples[base..base + DCTSIZE]) {
            *dst = src as i32;
        }
        data[base..base + DCTSIZE].copy_from_slice(&fdct_1d(line, true));
    }

    for col in 0..DCTSIZE {
        let mut line = [0i32; DCTSIZE];
        for (k, dst) in line.iter_mut().enumerate() {
            *dst = data[k * DCTSIZE + col];
        }
        for (k, v) in fdct_1d(line, false).into_iter().enumerate() {
            coeffs[k * DCTSIZE + col] = v as i16;
        }
    }
}

/// Load an 8x8 block from a sample plane and center it around zero.
///
/// The block's top-left sample is `plane[y0 * stride + x0]`.
#[inline]
pub fn load_level_shifted(plane: &[u8], stride: usize, x0: usize, y0: usize) -> [i16; DCTSIZE2] {
    let mut block = [0i16; DCTSIZE2];
    for (row, out) in block.chunks_exact_mut(DCTSIZE).enumerate() {
        let start = (y0 + row) * stride + x0;
        for (dst, &src) in out.iter_mut().zip(&plane[start..start + DCTSIZE]) {
            *dst = src as i16 - 128;
        }
    }
    block
}

//! Color space conversion routines.
//!
//! This module implements RGB to YCbCr conversion following the CCIR 601-1
//! (BT.601) standard, as used by JPEG. The conversion uses fixed-point
//! arithmetic.
//!
//! The conversion equations are:
//! ```text
//! Y  =  0.29900 * R + 0.58700 * G + 0.11400 * B
//! Cb = -0.16874 * R - 0.33126 * G + 0.50000 * B + 128
//! Cr =  0.50000 * R - 0.41869 * G - 0.08131 * B + 128
//! ```

use crate::consts::BYTES_PER_PIXEL;
use crate::types::PixelLayout;

/// Fixed-point precision bits
const SCALEBITS: i32 = 16;

/// Half unit for rounding during right shift
const ONE_HALF: i32 = 1 << (SCALEBITS - 1);

/// Center value for Cb/Cr (added after the shift)
const CBCR_CENTER: i32 = 128;

/// FIX(x) = (x * (1 << SCALEBITS) + 0.5)
const fn fix(x: f64) -> i32 {
    (x * ((1i64 << SCALEBITS) as f64) + 0.5) as i32
}

const FIX_0_29900: i32 = fix(0.29900);
const FIX_0_58700: i32 = fix(0.58700);
const FIX_0_11400: i32 = fix(0.11400);
const FIX_0_16874: i32 = fix(0.16874);
const FIX_0_33126: i32 = fix(0.33126);
const FIX_0_50000: i32 = fix(0.50000);
const FIX_0_41869: i32 = fix(0.41869);
const FIX_0_08131: i32 = fix(0.08131);

/// Convert a single RGB pixel to YCbCr.
///
/// Returns (Y, Cb, Cr), each in range 0-255.
#[inline]
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as i32;
    let g = g as i32;
    let b = b as i32;

    let y = (FIX_0_29900 * r + FIX_0_58700 * g + FIX_0_11400 * b + ONE_HALF) >> SCALEBITS;
    let cb = ((-FIX_0_16874 * r - FIX_0_33126 * g + FIX_0_50000 * b + ONE_HALF) >> SCALEBITS)
        + CBCR_CENTER;
    let cr = ((FIX_0_50000 * r - FIX_0_41869 * g - FIX_0_08131 * b + ONE_HALF) >> SCALEBITS)
        + CBCR_CENTER;

    (
        y.clamp(0, 255) as u8,
        cb.clamp(0, 255) as u8,
        cr.clamp(0, 255) as u8,
    )
}

/// Convert one row of packed 4-byte pixels into Y, Cb and Cr planes.
///
/// `packed` holds exactly `y_out.len()` pixels in `layout` order; the
/// padding byte of each pixel is never read.
pub fn convert_packed_row(
    packed: &[u8],
    layout: PixelLayout,
    y_out: &mut [u8],
    cb_out: &mut [u8],
    cr_out: &mut [u8],
) {
    debug_assert_eq!(packed.len(), y_out.len() * BYTES_PER_PIXEL);
    debug_assert_eq!(y_out.len(), cb_out.len());
    debug_assert_eq!(y_out.len(), cr_out.len());

    let (ri, gi, bi) = layout.rgb_offsets();
    let outputs = y_out.iter_mut().zip(cb_out.iter_mut()).zip(cr_out.iter_mut());
    for (px, ((y, cb), cr)) in packed.chunks_exact(BYTES_PER_PIXEL).zip(outputs) {
        (*y, *cb, *cr) = rgb_to_ycbcr(px[ri], px[gi], px[bi]);
    }
}

//! Edge expansion and chroma downsampling.
//!
//! Planes are padded out to whole MCUs by replicating the last column and
//! the last row, then chroma planes are reduced with a box filter. Rounding
//! alternates its bias from one output sample to the next so that the
//! reduced plane is not systematically brighter or darker.
//!
//! Reference: libjpeg jcsample.c

use crate::consts::DCTSIZE;

/// Pad a row out to its full length by replicating sample `width - 1`.
#[inline]
pub fn expand_right_edge(row: &mut [u8], width: usize) {
    debug_assert!(width > 0 && width <= row.len());
    let edge = row[width - 1];
    row[width..].fill(edge);
}

/// Downsample a row with 2:1 horizontal ratio (4:2:2).
///
/// Averages pairs of pixels horizontally. Uses alternating bias (0, 1, 0, 1...).
pub fn downsample_h2v1_row(input: &[u8], output: &mut [u8]) {
    debug_assert!(output.len() * 2 <= input.len());

    let mut bias = 0u16;
    for (out, pair) in output.iter_mut().zip(input.chunks_exact(2)) {
        *out = ((pair[0] as u16 + pair[1] as u16 + bias) >> 1) as u8;
        bias ^= 1;
    }
}

/// Downsample two rows with 2:1 horizontal and vertical ratio (4:2:0).
///
/// Averages 2x2 blocks. Uses alternating bias (1, 2, 1, 2...).
pub fn downsample_h2v2_rows(row0: &[u8], row1: &[u8], output: &mut [u8]) {
    debug_assert_eq!(row0.len(), row1.len());
    debug_assert!(output.len() * 2 <= row0.len());

    let mut bias = 1u16;
    let pairs = row0.chunks_exact(2).zip(row1.chunks_exact(2));
    for (out, (top, bottom)) in output.iter_mut().zip(pairs) {
        let sum = top[0] as u16 + top[1] as u16 + bottom[0] as u16 + bottom[1] as u16;
        *out = ((sum + bias) >> 2) as u8;
        bias ^= 3;
    }
}

/// Downsample two rows with 1:1 horizontal, 2:1 vertical ratio (4:4:0).
pub fn downsample_h1v2_rows(row0: &[u8], row1: &[u8], output: &mut [u8]) {
    debug_assert_eq!(row0.len(), row1.len());

    for (out, (&a, &b)) in output.iter_mut().zip(row0.iter().zip(row1.iter())) {
        *out = ((a as u16 + b as u16 + 1) >> 1) as u8;
    }
}

/// Downsample a plane by `h_ratio` x `v_ratio` (each 1 or 2).
///
/// `input` is `input_height` rows of `input_width` samples; both dimensions
/// must already be multiples of their ratio.
pub fn downsample_plane(
    input: &[u8],
    input_width: usize,
    input_height: usize,
    h_ratio: usize,
    v_ratio: usize,
    output: &mut [u8],
) {
    debug_assert!(input_width % h_ratio == 0 && input_height % v_ratio == 0);

    let output_width = input_width / h_ratio;
    let output_height = input_height / v_ratio;
    debug_assert!(output.len() >= output_width * output_height);

    if h_ratio == 1 && v_ratio == 1 {
        let n = input_width * input_height;
        output[..n].copy_from_slice(&input[..n]);
        return;
    }

    let mut in_rows = input.chunks_exact(input_width);
    let out_rows = output.chunks_exact_mut(output_width).take(output_height);

    if v_ratio == 1 {
        for (out, row) in out_rows.zip(in_rows) {
            downsample_h2v1_row(row, out);
        }
        return;
    }

    for out in out_rows {
        let (Some(r0), Some(r1)) = (in_rows.next(), in_rows.next()) else {
            break;
        };
        if h_ratio == 2 {
            downsample_h2v2_rows(r0, r1, out);
        } else {
            downsample_h1v2_rows(r0, r1, out);
        }
    }
}

/// Round `width` up to a whole number of MCUs of `mcu_width` pixels.
#[inline]
pub fn mcu_aligned(width: usize, mcu_width: usize) -> usize {
    debug_assert!(mcu_width % DCTSIZE == 0);
    width.div_ceil(mcu_width) * mcu_width
}

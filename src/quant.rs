//! Quantization tables and coefficient quantization.
//!
//! Tables are the Annex K tables scaled by the libjpeg quality curve.
//! Quantization divides the DCT output (scaled by 8) by `8 * q` and rounds
//! half away from zero, as `jcdctmgr.c` does.

use crate::consts::{DCTSIZE2, STD_CHROMINANCE_QUANT_TBL, STD_LUMINANCE_QUANT_TBL};
use crate::types::QuantTable;

/// Convert a quality rating (1-100) to a percentage scale factor.
///
/// Quality 50 uses the base tables as is; lower qualities scale up to 5000%,
/// higher ones scale down to 0% (every entry then clamps to 1).
pub fn quality_scaling(quality: u8) -> u32 {
    let quality = quality.clamp(1, 100) as u32;
    if quality < 50 {
        5000 / quality
    } else {
        200 - quality * 2
    }
}

/// Build the (luminance, chrominance) tables for a quality level.
pub fn create_quant_tables(quality: u8, force_baseline: bool) -> (QuantTable, QuantTable) {
    let scale = quality_scaling(quality);
    (
        QuantTable::scaled(&STD_LUMINANCE_QUANT_TBL, scale, force_baseline),
        QuantTable::scaled(&STD_CHROMINANCE_QUANT_TBL, scale, force_baseline),
    )
}

/// Quantize a block of DCT coefficients.
///
/// # Arguments
/// * `coeffs` - DCT output in natural order, scaled by 8
/// * `qtable` - Quantization values in natural order
/// * `output` - Quantized coefficients in natural order
#[inline]
pub fn quantize_block(
    coeffs: &[i16; DCTSIZE2],
    qtable: &[u16; DCTSIZE2],
    output: &mut [i16; DCTSIZE2],
) {
    for ((out, &c), &q) in output.iter_mut().zip(coeffs.iter()).zip(qtable.iter()) {
        let divisor = (q as i32) << 3;
        let magnitude = ((c as i32).abs() + (divisor >> 1)) / divisor;
        *out = (if c < 0 { -magnitude } else { magnitude }) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_scaling() {
        assert_eq!(quality_scaling(1), 5000);
        assert_eq!(quality_scaling(25), 200);
        assert_eq!(quality_scaling(50), 100);
        assert_eq!(quality_scaling(93), 14);
        assert_eq!(quality_scaling(100), 0);
        // Out-of-range input is clamped
        assert_eq!(quality_scaling(0), 5000);
        assert_eq!(quality_scaling(200), 0);
    }

    #[test]
    fn test_quality_93_tables() {
        let (luma, chroma) = create_quant_tables(93, true);
        // (16 * 14 + 50) / 100 = 2, (11 * 14 + 50) / 100 = 2
        assert_eq!(luma.values[0], 2);
        assert_eq!(luma.values[1], 2);
        // (121 * 14 + 50) / 100 = 17
        assert_eq!(luma.values[53], 17);
        // (99 * 14 + 50) / 100 = 14
        assert_eq!(chroma.values[63], 14);
    }

    #[test]
    fn test_quality_50_is_base_table() {
        let (luma, chroma) = create_quant_tables(50, true);
        assert_eq!(luma.values, STD_LUMINANCE_QUANT_TBL);
        assert_eq!(chroma.values, STD_CHROMINANCE_QUANT_TBL);
    }

    #[test]
    fn test_low_quality_baseline_clamp() {
        let (luma, _) = create_quant_tables(1, true);
        assert!(luma.values.iter().all(|&v| v <= 255));
        let (luma, _) = create_quant_tables(1, false);
        assert!(luma.values.iter().any(|&v| v > 255));
    }

    #[test]
    fn test_quantize_rounds_half_away_from_zero() {
        let qtable = [2u16; DCTSIZE2];
        let mut coeffs = [0i16; DCTSIZE2];
        // Divisor is 16
        coeffs[0] = 8;
        coeffs[1] = -8;
        coeffs[2] = 7;
        coeffs[3] = -7;
        coeffs[4] = 6400;
        let mut out = [0i16; DCTSIZE2];
        quantize_block(&coeffs, &qtable, &mut out);
        assert_eq!(&out[..5], &[1, -1, 0, 0, 400]);
    }
}

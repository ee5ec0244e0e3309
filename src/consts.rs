//! JPEG constants, markers, and the Annex K tables.
//!
//! This module contains all static data required for baseline encoding:
//! - JPEG marker codes
//! - DCT block dimensions
//! - Zigzag scan order
//! - Annex K quantization and Huffman tables
//! - Session limits (batch size, default quality)

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start of image marker
pub const JPEG_SOI: u8 = 0xD8;
/// End of image marker
pub const JPEG_EOI: u8 = 0xD9;
/// Start of frame (baseline DCT)
pub const JPEG_SOF0: u8 = 0xC0;
/// Define Huffman table
pub const JPEG_DHT: u8 = 0xC4;
/// Define quantization table
pub const JPEG_DQT: u8 = 0xDB;
/// Define restart interval
pub const JPEG_DRI: u8 = 0xDD;
/// Start of scan
pub const JPEG_SOS: u8 = 0xDA;
/// Restart markers (RST0-RST7)
pub const JPEG_RST0: u8 = 0xD0;
/// APP0 marker (JFIF)
pub const JPEG_APP0: u8 = 0xE0;

// =============================================================================
// DCT Constants
// =============================================================================

/// DCT block size (8x8)
pub const DCTSIZE: usize = 8;
/// DCT block size squared (64 coefficients)
pub const DCTSIZE2: usize = 64;
/// Number of color components produced from a packed pixel (Y, Cb, Cr)
pub const NUM_COMPONENTS: usize = 3;
/// Largest dimension a baseline frame header can carry
pub const MAX_DIMENSION: u32 = u16::MAX as u32;

// =============================================================================
// Session Limits
// =============================================================================

/// Maximum number of scanlines handed to the block pipeline per batch.
///
/// Row slices for one batch live in a fixed-size stack array, so this also
/// bounds the driver's stack usage.
pub const MAX_ROWS_PER_BATCH: usize = 256;

/// Quality used by a freshly created session.
pub const DEFAULT_QUALITY: u8 = 93;

/// Bytes per packed source pixel.
pub const BYTES_PER_PIXEL: usize = 4;

// =============================================================================
// Zigzag Order
// =============================================================================

/// Zigzag position to natural (row-major) index.
pub const JPEG_NATURAL_ORDER: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

// =============================================================================
// Quantization Tables
// =============================================================================

/// Annex K luminance quantization table (natural order, quality 50).
pub const STD_LUMINANCE_QUANT_TBL: [u16; DCTSIZE2] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81, 104, 113,
    92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// Annex K chrominance quantization table (natural order, quality 50).
pub const STD_CHROMINANCE_QUANT_TBL: [u16; DCTSIZE2] = [
    17, 18, 24, 47, 99, 99, 99, 99, 18, 21, 26, 66, 99, 99, 99, 99, 24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
];

// =============================================================================
// Standard Huffman Tables
// =============================================================================

/// DC luminance Huffman table - number of codes of each length (bits)
pub const DC_LUMINANCE_BITS: [u8; 17] = [0, 0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];

/// DC luminance Huffman table - symbol values
pub const DC_LUMINANCE_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// DC chrominance Huffman table - number of codes of each length
pub const DC_CHROMINANCE_BITS: [u8; 17] = [0, 0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];

/// DC chrominance Huffman table - symbol values
pub const DC_CHROMINANCE_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// AC luminance Huffman table - number of codes of each length
pub const AC_LUMINANCE_BITS: [u8; 17] = [0, 0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];

/// AC luminance Huffman table - symbol values (162 symbols)
pub const AC_LUMINANCE_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// AC chrominance Huffman table - number of codes of each length
pub const AC_CHROMINANCE_BITS: [u8; 17] = [0, 0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77];

/// AC chrominance Huffman table - symbol values (162 symbols)
pub const AC_CHROMINANCE_VALUES: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_order_is_permutation() {
        let mut seen = [false; DCTSIZE2];
        for &idx in JPEG_NATURAL_ORDER.iter() {
            assert!(!seen[idx], "index {} appears twice", idx);
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_huffman_bits_match_value_counts() {
        let count = |bits: &[u8; 17]| bits[1..].iter().map(|&b| b as usize).sum::<usize>();
        assert_eq!(count(&DC_LUMINANCE_BITS), DC_LUMINANCE_VALUES.len());
        assert_eq!(count(&DC_CHROMINANCE_BITS), DC_CHROMINANCE_VALUES.len());
        assert_eq!(count(&AC_LUMINANCE_BITS), AC_LUMINANCE_VALUES.len());
        assert_eq!(count(&AC_CHROMINANCE_BITS), AC_CHROMINANCE_VALUES.len());
    }

    #[test]
    fn test_session_limits() {
        assert_eq!(MAX_ROWS_PER_BATCH, 256);
        assert_eq!(DEFAULT_QUALITY, 93);
    }
}

//! Core type definitions for the encoder.
//!
//! Pixel layouts, sampling modes, and the frame/scan descriptors that the
//! marker writer and the block pipeline share.

use crate::consts::{DCTSIZE, DCTSIZE2, NUM_COMPONENTS};

// =============================================================================
// Pixel Layout
// =============================================================================

/// Byte order of a packed 32-bit source pixel.
///
/// One byte of every pixel is padding and never read. The names list bytes
/// in memory order, so on a little-endian machine [`PixelLayout::Bgrx`] is
/// the common `0x00RRGGBB` framebuffer word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum PixelLayout {
    /// Blue, green, red, padding
    #[default]
    Bgrx,
    /// Red, green, blue, padding
    Rgbx,
    /// Padding, red, green, blue
    Xrgb,
    /// Padding, blue, green, red
    Xbgr,
}

impl PixelLayout {
    /// Byte offsets of (red, green, blue) within one 4-byte pixel.
    pub const fn rgb_offsets(self) -> (usize, usize, usize) {
        match self {
            PixelLayout::Bgrx => (2, 1, 0),
            PixelLayout::Rgbx => (0, 1, 2),
            PixelLayout::Xrgb => (1, 2, 3),
            PixelLayout::Xbgr => (3, 2, 1),
        }
    }

    /// Mask selecting the three color bytes of a pixel read as a
    /// native-endian `u32`.
    pub const fn color_mask(self) -> u32 {
        let padding = match self {
            PixelLayout::Bgrx | PixelLayout::Rgbx => 3,
            PixelLayout::Xrgb | PixelLayout::Xbgr => 0,
        };
        let mut bytes = [0xFF; 4];
        bytes[padding] = 0;
        u32::from_ne_bytes(bytes)
    }
}

// =============================================================================
// Sampling Factor / Subsampling
// =============================================================================

/// Chroma subsampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Subsampling {
    /// 4:4:4 - No subsampling (highest quality)
    #[default]
    S444,
    /// 4:2:2 - Horizontal subsampling
    S422,
    /// 4:2:0 - Horizontal and vertical subsampling
    S420,
    /// 4:4:0 - Vertical subsampling only
    S440,
}

impl Subsampling {
    /// Returns (h_samp_factor, v_samp_factor) for luminance component.
    pub const fn luma_factors(self) -> (u8, u8) {
        match self {
            Subsampling::S444 => (1, 1),
            Subsampling::S422 => (2, 1),
            Subsampling::S420 => (2, 2),
            Subsampling::S440 => (1, 2),
        }
    }

    /// Returns (h_samp_factor, v_samp_factor) for chroma components.
    pub const fn chroma_factors(self) -> (u8, u8) {
        (1, 1)
    }

    /// MCU size in pixels as (width, height).
    pub const fn mcu_size(self) -> (usize, usize) {
        let (h, v) = self.luma_factors();
        (DCTSIZE * h as usize, DCTSIZE * v as usize)
    }
}

// =============================================================================
// Scan Info
// =============================================================================

/// Describes the single sequential scan of a baseline frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanInfo {
    /// Number of components in this scan (1-3)
    pub comps_in_scan: u8,
    /// Component indices for this scan
    pub component_index: [u8; NUM_COMPONENTS],
    /// Spectral selection start (always 0 for sequential)
    pub ss: u8,
    /// Spectral selection end (always 63 for sequential)
    pub se: u8,
    /// Successive approximation high bit
    pub ah: u8,
    /// Successive approximation low bit
    pub al: u8,
}

impl ScanInfo {
    /// Interleaved sequential scan over all three components.
    pub const fn sequential() -> Self {
        Self {
            comps_in_scan: NUM_COMPONENTS as u8,
            component_index: [0, 1, 2],
            ss: 0,
            se: (DCTSIZE2 - 1) as u8,
            ah: 0,
            al: 0,
        }
    }
}

impl Default for ScanInfo {
    fn default() -> Self {
        Self::sequential()
    }
}

// =============================================================================
// Component Info
// =============================================================================

/// Information about a single image component (color channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Component identifier (1=Y, 2=Cb, 3=Cr)
    pub component_id: u8,
    /// Index in component array
    pub component_index: u8,
    /// Horizontal sampling factor (1-2)
    pub h_samp_factor: u8,
    /// Vertical sampling factor (1-2)
    pub v_samp_factor: u8,
    /// Quantization table index (0-1)
    pub quant_tbl_no: u8,
    /// DC Huffman table index (0-1)
    pub dc_tbl_no: u8,
    /// AC Huffman table index (0-1)
    pub ac_tbl_no: u8,
}

impl Default for ComponentInfo {
    fn default() -> Self {
        Self {
            component_id: 1,
            component_index: 0,
            h_samp_factor: 1,
            v_samp_factor: 1,
            quant_tbl_no: 0,
            dc_tbl_no: 0,
            ac_tbl_no: 0,
        }
    }
}

impl ComponentInfo {
    /// Blocks this component contributes to one MCU.
    pub const fn blocks_in_mcu(&self) -> usize {
        self.h_samp_factor as usize * self.v_samp_factor as usize
    }
}

// =============================================================================
// Quantization Table
// =============================================================================

/// A quantization table with 64 coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantTable {
    /// Quantization values in natural (row-major) order
    pub values: [u16; DCTSIZE2],
}

impl QuantTable {
    /// Create a new quantization table from values.
    pub const fn new(values: [u16; DCTSIZE2]) -> Self {
        Self { values }
    }

    /// Create from a base table scaled by a quality factor.
    /// Scale factor is a percentage (100 = use table as-is).
    pub fn scaled(base: &[u16; DCTSIZE2], scale_factor: u32, force_baseline: bool) -> Self {
        let max = if force_baseline { 255 } else { 32767 };
        let mut values = [0u16; DCTSIZE2];
        for (value, &b) in values.iter_mut().zip(base.iter()) {
            let temp = ((b as u32) * scale_factor + 50) / 100;
            *value = temp.clamp(1, max) as u16;
        }
        Self { values }
    }
}

impl Default for QuantTable {
    fn default() -> Self {
        Self {
            values: [16; DCTSIZE2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets_skip_padding() {
        for layout in [
            PixelLayout::Bgrx,
            PixelLayout::Rgbx,
            PixelLayout::Xrgb,
            PixelLayout::Xbgr,
        ] {
            let (r, g, b) = layout.rgb_offsets();
            let mut used = [false; 4];
            used[r] = true;
            used[g] = true;
            used[b] = true;
            assert_eq!(used.iter().filter(|&&u| u).count(), 3, "{:?}", layout);
        }
        assert_eq!(PixelLayout::default(), PixelLayout::Bgrx);
    }

    #[test]
    fn test_color_mask_clears_padding_byte() {
        for layout in [
            PixelLayout::Bgrx,
            PixelLayout::Rgbx,
            PixelLayout::Xrgb,
            PixelLayout::Xbgr,
        ] {
            let bytes = layout.color_mask().to_ne_bytes();
            let (r, g, b) = layout.rgb_offsets();
            assert_eq!((bytes[r], bytes[g], bytes[b]), (0xFF, 0xFF, 0xFF));
            assert_eq!(bytes.iter().filter(|&&v| v == 0).count(), 1, "{:?}", layout);
        }
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_bgrx_mask_is_rgb_word() {
        assert_eq!(PixelLayout::Bgrx.color_mask(), 0x00FF_FFFF);
        assert_eq!(PixelLayout::Xrgb.color_mask(), 0xFFFF_FF00);
    }

    #[test]
    fn test_mcu_sizes() {
        assert_eq!(Subsampling::S444.mcu_size(), (8, 8));
        assert_eq!(Subsampling::S422.mcu_size(), (16, 8));
        assert_eq!(Subsampling::S420.mcu_size(), (16, 16));
        assert_eq!(Subsampling::S440.mcu_size(), (8, 16));
    }

    #[test]
    fn test_scaled_clamps_for_baseline() {
        let base = [200u16; DCTSIZE2];
        let table = QuantTable::scaled(&base, 500, true);
        assert!(table.values.iter().all(|&v| v == 255));

        let table = QuantTable::scaled(&base, 500, false);
        assert!(table.values.iter().all(|&v| v == 1000));

        let table = QuantTable::scaled(&[1u16; DCTSIZE2], 1, true);
        assert!(table.values.iter().all(|&v| v == 1));
    }

    #[test]
    fn test_sequential_scan_covers_all_coefficients() {
        let scan = ScanInfo::sequential();
        assert_eq!(scan.comps_in_scan, 3);
        assert_eq!((scan.ss, scan.se, scan.ah, scan.al), (0, 63, 0, 0));
    }
}

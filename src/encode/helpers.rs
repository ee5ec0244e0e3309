//! Helper functions for the encoder pipeline.
//!
//! Fallible scratch allocation, the frame's component layout, and the
//! standard table set shared by every image a session encodes.

use crate::consts::{
    AC_CHROMINANCE_BITS, AC_CHROMINANCE_VALUES, AC_LUMINANCE_BITS, AC_LUMINANCE_VALUES,
    DC_CHROMINANCE_BITS, DC_CHROMINANCE_VALUES, DC_LUMINANCE_BITS, DC_LUMINANCE_VALUES,
    NUM_COMPONENTS,
};
use crate::error::Result;
use crate::huffman::{DerivedTable, HuffTable};
use crate::quant::create_quant_tables;
use crate::types::{ComponentInfo, QuantTable, Subsampling};

// ============================================================================
// Allocation Helpers
// ============================================================================

/// Resize `v` to `len` elements, reserving fallibly when it has to grow.
///
/// Capacity is never released, so a session's buffers settle at the size
/// of the largest image it has seen.
#[inline]
pub(crate) fn try_grow_vec<T: Clone>(v: &mut Vec<T>, value: T, len: usize) -> Result<()> {
    if len > v.len() {
        v.try_reserve_exact(len - v.len())?;
    }
    v.resize(len, value);
    Ok(())
}

// ============================================================================
// Component Layout
// ============================================================================

/// Y, Cb and Cr descriptors for a frame using `subsampling`.
///
/// Luma uses quantization and Huffman slot 0, both chroma components slot 1.
pub(crate) fn create_components(subsampling: Subsampling) -> [ComponentInfo; NUM_COMPONENTS] {
    let (luma_h, luma_v) = subsampling.luma_factors();
    let (chroma_h, chroma_v) = subsampling.chroma_factors();

    let mut components = [ComponentInfo::default(); NUM_COMPONENTS];
    for (i, comp) in components.iter_mut().enumerate() {
        let is_luma = i == 0;
        let slot = u8::from(!is_luma);
        *comp = ComponentInfo {
            component_id: i as u8 + 1,
            component_index: i as u8,
            h_samp_factor: if is_luma { luma_h } else { chroma_h },
            v_samp_factor: if is_luma { luma_v } else { chroma_v },
            quant_tbl_no: slot,
            dc_tbl_no: slot,
            ac_tbl_no: slot,
        };
    }
    components
}

// ============================================================================
// Standard Huffman Tables
// ============================================================================

/// Create standard DC luminance Huffman table.
pub(crate) fn create_std_dc_luma_table() -> HuffTable {
    HuffTable::from_spec(&DC_LUMINANCE_BITS, &DC_LUMINANCE_VALUES)
}

/// Create standard DC chrominance Huffman table.
pub(crate) fn create_std_dc_chroma_table() -> HuffTable {
    HuffTable::from_spec(&DC_CHROMINANCE_BITS, &DC_CHROMINANCE_VALUES)
}

/// Create standard AC luminance Huffman table.
pub(crate) fn create_std_ac_luma_table() -> HuffTable {
    HuffTable::from_spec(&AC_LUMINANCE_BITS, &AC_LUMINANCE_VALUES)
}

/// Create standard AC chrominance Huffman table.
pub(crate) fn create_std_ac_chroma_table() -> HuffTable {
    HuffTable::from_spec(&AC_CHROMINANCE_BITS, &AC_CHROMINANCE_VALUES)
}

/// The four Annex K tables in DHT order: (slot, is_ac, table).
pub(crate) fn std_huffman_tables() -> [(u8, bool, HuffTable); 4] {
    [
        (0, false, create_std_dc_luma_table()),
        (0, true, create_std_ac_luma_table()),
        (1, false, create_std_dc_chroma_table()),
        (1, true, create_std_ac_chroma_table()),
    ]
}

// ============================================================================
// Derived Table Set
// ============================================================================

/// Everything the block pipeline needs that depends only on configuration.
///
/// Built once per configuration and reused for every image until the
/// session is reconfigured.
#[derive(Clone, Debug)]
pub(crate) struct EncodeTables {
    /// Quality the quantization tables were scaled for
    pub quality: u8,
    /// Quantization tables by slot (0 = luma, 1 = chroma)
    pub quant: [QuantTable; 2],
    /// Raw Huffman tables in DHT order, for writing into the stream
    pub huffman: [(u8, bool, HuffTable); 4],
    /// DC encoding tables by slot
    pub dc: [DerivedTable; 2],
    /// AC encoding tables by slot
    pub ac: [DerivedTable; 2],
}

impl EncodeTables {
    /// Scale the quantization tables for `quality` and derive the standard
    /// Huffman codes. Tables are always forced to baseline precision.
    pub fn build(quality: u8) -> Result<Self> {
        let (luma_q, chroma_q) = create_quant_tables(quality, true);
        let huffman = std_huffman_tables();

        let dc = [
            DerivedTable::from_huff_table(&huffman[0].2, true)?,
            DerivedTable::from_huff_table(&huffman[2].2, true)?,
        ];
        let ac = [
            DerivedTable::from_huff_table(&huffman[1].2, false)?,
            DerivedTable::from_huff_table(&huffman[3].2, false)?,
        ];

        Ok(Self {
            quality,
            quant: [luma_q, chroma_q],
            huffman,
            dc,
            ac,
        })
    }
}
